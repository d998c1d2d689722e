//! kbscan - document tree scanner producing privacy-scrubbed
//! Markdown surrogates and a latest-document map.
//!
//! The scanner walks configured roots, follows shortcuts under an
//! explicit policy, extracts a bounded outline per document, redacts
//! sensitive patterns, and only re-extracts files whose fingerprint
//! changed since the previous run.

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod filter;
pub mod fingerprint;
pub mod mask;
pub mod orchestrator;
pub mod paths;
pub mod render;
pub mod shortcut;
pub mod state;
pub mod summary;
pub mod version;

pub use classify::{Classification, Classifier};
pub use config::{MaskingConfig, ScanConfig, ShortcutConfig};
pub use error::{Result, ScanError, Skip, SkipReason};
pub use extract::{DocumentFormat, ExtractedDocument};
pub use fingerprint::FileFingerprint;
pub use mask::{Masker, RedactedDocument};
pub use orchestrator::{ScanOrchestrator, ScanOutcome};
pub use render::DocRecord;
pub use shortcut::{ScanTarget, ShortcutResolver};
pub use state::StateStore;
pub use version::{VersionOrdinal, VersionParser, VersionResolver};

/// Crate version, as reported in CLI output
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_format() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
