//! Extractive summary and keyword scoring
//!
//! Everything here operates on the already-bounded preview text, so
//! the cost per document is small and no additional content leaves
//! the extraction bounds. Works on Japanese and English text alike:
//! tokens are kana/kanji runs, latin words or digit runs, and CJK
//! sentence terminators split without trailing whitespace.

use crate::error::{Result, ScanError};
use regex::Regex;

const TOKEN_PATTERN: &str = r"[\p{Hiragana}\p{Katakana}\p{Han}]{2,}|[A-Za-z]{3,}|[0-9]{2,}";
const MIN_SENTENCE_CHARS: usize = 10;
const MAX_SCORED_SENTENCES: usize = 80;

pub struct Summarizer {
    tokens: Regex,
    max_sentences: usize,
    topk: usize,
}

impl Summarizer {
    pub fn new(max_sentences: usize, topk: usize) -> Result<Self> {
        let tokens = Regex::new(TOKEN_PATTERN)
            .map_err(|e| ScanError::Config(format!("token pattern: {}", e)))?;
        Ok(Self {
            tokens,
            max_sentences,
            topk,
        })
    }

    /// Frequency-scored extractive summary: the highest-scoring
    /// sentences, re-emitted in document order.
    pub fn summarize(&self, text: &str) -> String {
        let sentences: Vec<String> = split_sentences(text)
            .into_iter()
            .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
            .take(MAX_SCORED_SENTENCES)
            .collect();
        if sentences.is_empty() {
            return String::new();
        }

        let mut freq = std::collections::HashMap::new();
        let tokenized: Vec<Vec<String>> = sentences
            .iter()
            .map(|s| {
                self.tokens
                    .find_iter(s)
                    .map(|m| m.as_str().to_lowercase())
                    .collect()
            })
            .collect();
        for tokens in &tokenized {
            for token in tokens {
                *freq.entry(token.clone()).or_insert(0u32) += 1;
            }
        }

        // Long sentences are dampened so boilerplate paragraphs do not
        // dominate purely by token count
        let mut scored: Vec<(usize, f64)> = tokenized
            .iter()
            .enumerate()
            .map(|(i, tokens)| {
                let sum: f64 = tokens
                    .iter()
                    .map(|t| (1.0 + f64::from(freq[t])).ln())
                    .sum();
                (i, sum / (1.0 + (tokens.len() as f64).sqrt()))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut picked: Vec<usize> = scored
            .into_iter()
            .take(self.max_sentences)
            .map(|(i, _)| i)
            .collect();
        picked.sort_unstable();
        picked
            .into_iter()
            .map(|i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Top-k tokens by frequency; ties prefer longer, then
    /// alphabetical, so the result is deterministic.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        let mut freq = std::collections::HashMap::new();
        for m in self.tokens.find_iter(text) {
            *freq.entry(m.as_str().to_lowercase()).or_insert(0u32) += 1;
        }
        let mut ranked: Vec<(String, u32)> = freq.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then(b.0.chars().count().cmp(&a.0.chars().count()))
                .then(a.0.cmp(&b.0))
        });
        ranked.into_iter().take(self.topk).map(|(t, _)| t).collect()
    }
}

/// Sentence boundaries: CJK terminators split immediately, ASCII
/// terminators split before whitespace, newlines always split.
fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut after_terminator = false;

    let mut flush = |current: &mut String, out: &mut Vec<String>| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
        current.clear();
    };

    for c in text.chars() {
        if c == '\n' || (after_terminator && c.is_whitespace()) {
            flush(&mut current, &mut out);
            after_terminator = false;
            continue;
        }
        current.push(c);
        if matches!(c, '。' | '！' | '？') {
            flush(&mut current, &mut out);
            after_terminator = false;
        } else {
            after_terminator = matches!(c, '.' | '!' | '?');
        }
    }
    flush(&mut current, &mut out);
    out
}
