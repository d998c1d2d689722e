//! Best-effort PDF extraction
//!
//! Only uncompressed text operators are read: parenthesized string
//! literals inside BT..ET blocks, plus the document /Title when it is
//! a plain literal. Compressed streams yield an empty outline rather
//! than an error, so a scan never stalls on an opaque PDF.

use super::{truncate_chars, Outline};
use crate::config::ExtractLimits;
use crate::error::Result;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

const MAX_READ_BYTES: u64 = 8 * 1024 * 1024;
const HEADING_CHARS: usize = 120;

pub(super) fn extract(path: &Path, limits: &ExtractLimits) -> Result<Outline> {
    let mut bytes = Vec::new();
    std::fs::File::open(path)?
        .take(MAX_READ_BYTES)
        .read_to_end(&mut bytes)?;
    let raw = String::from_utf8_lossy(&bytes);

    let mut metadata = BTreeMap::new();
    if let Some(title) = dict_literal(&raw, "/Title") {
        if !title.is_empty() {
            metadata.insert("title".to_string(), title);
        }
    }

    let mut headings = Vec::new();
    let mut preview_parts = Vec::new();
    let mut rest: &str = &raw;
    let mut page = 0usize;

    while let Some(bt) = rest.find("BT") {
        let after = &rest[bt + 2..];
        let Some(et) = after.find("ET") else { break };
        let block = &after[..et];
        rest = &after[et + 2..];

        let literals = string_literals(block);
        let text = literals.join(" ");
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        page += 1;
        if page > limits.max_pdf_pages {
            break;
        }
        if headings.len() < limits.max_headings {
            headings.push(format!("Page {}: {}", page, truncate_chars(text, HEADING_CHARS)));
        }
        preview_parts.push(text.to_string());
    }

    Ok(Outline {
        headings,
        preview: preview_parts.join("\n"),
        metadata,
    })
}

/// Value of `key (literal)` in a dictionary, e.g. `/Title (Spec v2)`
fn dict_literal(raw: &str, key: &str) -> Option<String> {
    let pos = raw.find(key)? + key.len();
    let tail = raw[pos..].trim_start();
    if !tail.starts_with('(') {
        return None;
    }
    string_literals(tail).into_iter().next()
}

/// All `(...)` string literals in `block`, honoring backslash escapes
/// and balanced nested parentheses.
fn string_literals(block: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = block.chars();

    while let Some(c) = chars.next() {
        if c != '(' {
            continue;
        }
        let mut literal = String::new();
        let mut depth = 1usize;
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        match escaped {
                            'n' => literal.push('\n'),
                            't' => literal.push('\t'),
                            'r' | 'f' | 'b' => literal.push(' '),
                            other => literal.push(other),
                        }
                    }
                }
                '(' => {
                    depth += 1;
                    literal.push('(');
                }
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    literal.push(')');
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            out.push(literal);
        }
    }
    out
}
