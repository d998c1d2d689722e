//! Bounded per-format extraction
//!
//! One extractor per supported format behind a single capability:
//! `extract(path, format, limits) -> Outline`. Extraction is bounded
//! by design: headings plus a small prefix of body text, never the
//! full document. Dispatch is a fixed registry keyed by extension, so
//! an unsupported extension is a typed result, not a lookup failure.

mod docx;
mod ooxml;
mod pdf;
mod pptx;
mod text;
mod xlsx;

use crate::config::ExtractLimits;
use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Docx,
    Xlsx,
    Pptx,
    Pdf,
    Markdown,
    Text,
    Sql,
}

impl DocumentFormat {
    /// Extension registry (case-insensitive). `None` means kbscan has
    /// no extractor for the extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "docx" => Some(Self::Docx),
            "xlsx" => Some(Self::Xlsx),
            "pptx" => Some(Self::Pptx),
            "pdf" => Some(Self::Pdf),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::Text),
            "sql" => Some(Self::Sql),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
            Self::Pdf => "pdf",
            Self::Markdown => "md",
            Self::Text => "txt",
            Self::Sql => "sql",
        }
    }
}

/// Raw extraction result before summarization and masking
#[derive(Debug, Clone, Default)]
pub struct Outline {
    pub headings: Vec<String>,
    pub preview: String,
    pub metadata: BTreeMap<String, String>,
}

/// Structured content of one changed file, produced once per run.
/// Free-text fields must pass through the masker (`RedactedDocument`)
/// before rendering.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub headings: Vec<String>,
    pub preview: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub raw_metadata: BTreeMap<String, String>,
}

/// Run the extractor for `format` and clamp the result to the
/// configured bounds. Any failure comes back as a typed
/// `ScanError::Extraction` carrying the path and reason.
pub fn extract(path: &Path, format: DocumentFormat, limits: &ExtractLimits) -> Result<Outline> {
    let result = match format {
        DocumentFormat::Docx => docx::extract(path, limits),
        DocumentFormat::Xlsx => xlsx::extract(path, limits),
        DocumentFormat::Pptx => pptx::extract(path, limits),
        DocumentFormat::Pdf => pdf::extract(path, limits),
        DocumentFormat::Markdown | DocumentFormat::Text | DocumentFormat::Sql => {
            text::extract(path, limits)
        }
    };

    let mut outline = result.map_err(|e| match e {
        already @ ScanError::Extraction { .. } => already,
        other => ScanError::Extraction {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })?;

    outline.headings.truncate(limits.max_headings);
    let preview = normalize_newlines(&outline.preview);
    outline.preview = truncate_chars(&preview, limits.max_extract_chars);
    Ok(outline)
}

/// CRLF and bare-CR to LF, so surrogates are LF-only regardless of
/// where the source document was authored
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Char-boundary-safe truncation
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
