//! Sensitive-pattern redaction
//!
//! Every free-text field is passed through the masker before it can
//! leave the process. Redaction is pure and total: it always
//! terminates and never fails at apply time (patterns are compiled up
//! front).

use crate::config::MaskingConfig;
use crate::error::{Result, ScanError};
use crate::extract::ExtractedDocument;
use regex::Regex;
use std::collections::HashSet;

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";
const PHONE_PATTERN: &str = r"(?:\+\d{1,3}[- ]?)?\(?\d{2,4}\)?[- ]\d{3,4}[- ]\d{3,4}";
const IPV4_PATTERN: &str = r"\b(?:\d{1,3}\.){3}\d{1,3}\b";
const IPV6_PATTERN: &str = r"\b(?:[0-9A-Fa-f]{1,4}:){2,7}[0-9A-Fa-f]{1,4}\b";
const PASSWORD_PATTERN: &str =
    r"(?i)\b(?:password|passwd|pwd|secret|token|api[_-]?key)\b\s*[:=]\s*\S+";

pub struct Masker {
    rules: Vec<(Regex, String)>,
}

impl Masker {
    /// Compile the enabled rules. Built-ins run in a fixed order
    /// (email, ip, phone, password-like), custom rules after.
    pub fn new(config: &MaskingConfig) -> Result<Self> {
        let mut rules = Vec::new();

        let mut built_in = |pattern: &str, replace: &str| -> Result<()> {
            let rx = Regex::new(pattern)
                .map_err(|e| ScanError::Config(format!("mask pattern '{}': {}", pattern, e)))?;
            rules.push((rx, replace.to_string()));
            Ok(())
        };

        if config.email {
            built_in(EMAIL_PATTERN, "[EMAIL]")?;
        }
        if config.ip {
            built_in(IPV4_PATTERN, "[IP]")?;
            built_in(IPV6_PATTERN, "[IP]")?;
        }
        if config.phone {
            built_in(PHONE_PATTERN, "[PHONE]")?;
        }
        if config.password_like {
            built_in(PASSWORD_PATTERN, "[SECRET]")?;
        }

        for rule in &config.custom {
            let rx = Regex::new(&rule.pattern).map_err(|e| {
                ScanError::Config(format!("mask pattern '{}': {}", rule.pattern, e))
            })?;
            rules.push((rx, rule.replace.clone()));
        }

        Ok(Self { rules })
    }

    /// Replace every match of every enabled rule. Pure and total.
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (rx, replace) in &self.rules {
            out = rx.replace_all(&out, replace.as_str()).into_owned();
        }
        out
    }
}

/// An `ExtractedDocument` whose free-text fields have all been passed
/// through the masker. Only constructible via `RedactedDocument::new`,
/// so unredacted content cannot reach rendering.
#[derive(Debug, Clone)]
pub struct RedactedDocument {
    doc: ExtractedDocument,
}

impl RedactedDocument {
    pub fn new(mut doc: ExtractedDocument, masker: &Masker) -> Self {
        for heading in &mut doc.headings {
            *heading = masker.redact(heading);
        }
        doc.preview = masker.redact(&doc.preview);
        doc.summary = masker.redact(&doc.summary);

        // Redaction can collapse distinct keywords into one token
        let mut seen = HashSet::new();
        doc.keywords = doc
            .keywords
            .iter()
            .map(|k| masker.redact(k))
            .filter(|k| seen.insert(k.clone()))
            .collect();

        for value in doc.raw_metadata.values_mut() {
            *value = masker.redact(value);
        }

        Self { doc }
    }

    pub fn inner(&self) -> &ExtractedDocument {
        &self.doc
    }

    pub fn into_inner(self) -> ExtractedDocument {
        self.doc
    }
}
