//! Error types for kbscan operations

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// kbscan error types
///
/// Only `Config`, `RootUnavailable` and `StatePersist` abort a run;
/// everything else is caught at the orchestrator boundary and recorded
/// as a per-file skip.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("config error: {0}")]
    Config(String),

    #[error("scan root unavailable: {0}")]
    RootUnavailable(PathBuf),

    #[error("extraction failed for {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    #[error("alias resolution failed for {path}: {reason}")]
    Alias { path: PathBuf, reason: String },

    #[error("state persist error: {0}")]
    StatePersist(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for kbscan operations
pub type Result<T> = std::result::Result<T, ScanError>;

impl From<serde_json::Error> for ScanError {
    fn from(e: serde_json::Error) -> Self {
        ScanError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for ScanError {
    fn from(e: serde_yaml::Error) -> Self {
        ScanError::Serialization(e.to_string())
    }
}

/// Why a target was excluded from the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Shortcut target resolves outside every configured root
    OutsideRoots,
    /// Shortcut chain revisits an already-resolved path or directory
    AliasCycle,
    /// Shortcut target does not exist, or the shortcut file is malformed
    BrokenShortcut(String),
    /// Directory walk error (permissions, vanished entry)
    WalkError(String),
    /// File metadata could not be read
    Stat(String),
    /// Format-specific extraction failure
    Extraction(String),
    /// Extension is allowed by config but no extractor exists for it
    UnsupportedFormat(String),
    /// Surrogate could not be written
    WriteFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OutsideRoots => write!(f, "target outside configured roots"),
            SkipReason::AliasCycle => write!(f, "alias cycle detected"),
            SkipReason::BrokenShortcut(r) => write!(f, "broken shortcut: {}", r),
            SkipReason::WalkError(r) => write!(f, "walk error: {}", r),
            SkipReason::Stat(r) => write!(f, "stat failed: {}", r),
            SkipReason::Extraction(r) => write!(f, "extraction failed: {}", r),
            SkipReason::UnsupportedFormat(ext) => write!(f, "unsupported format: {}", ext),
            SkipReason::WriteFailed(r) => write!(f, "write failed: {}", r),
        }
    }
}

/// A recorded, non-fatal exclusion: {path, reason}
#[derive(Debug, Clone)]
pub struct Skip {
    pub path: PathBuf,
    pub reason: SkipReason,
}

impl Skip {
    pub fn new(path: impl Into<PathBuf>, reason: SkipReason) -> Self {
        Self { path: path.into(), reason }
    }
}
