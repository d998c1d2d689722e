//! Scan configuration
//!
//! Loaded once from YAML, validated once, then passed immutably into
//! every component constructor. No component reads ambient state.

use crate::error::{Result, ScanError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for a scan run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directories to scan
    pub roots: Vec<PathBuf>,
    /// File extensions to index (without the leading dot)
    pub allowed_extensions: Vec<String>,
    /// Directory names excluded exactly (case-insensitive)
    pub exclude_dirs: Vec<String>,
    /// Directory names excluded by substring match, e.g. "old", "backup"
    pub exclude_dir_keywords: Vec<String>,
    /// Regex patterns excluding whole paths (dirs and files)
    pub exclude_path_patterns: Vec<String>,
    /// Shortcut / alias following policy
    pub shortcuts: ShortcutConfig,
    /// Sensitive-pattern redaction toggles
    pub masking: MaskingConfig,
    /// Extraction bounds
    pub limits: ExtractLimits,
    /// system / screen_id / doc_type inference rules
    pub classify: ClassifyConfig,
    /// Version-marker parsing toggles
    pub version: VersionRules,
    /// latest_map.md generation policy
    pub latest_map: LatestMapConfig,
    /// Also fingerprint file contents (SHA-256); slower, stronger
    pub hash_contents: bool,
    /// Sentences kept by the extractive summary
    pub summary_sentences: usize,
    /// Keywords kept per document
    pub keywords_topk: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: vec![],
            allowed_extensions: ["docx", "xlsx", "pptx", "pdf", "md", "txt", "sql"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude_dirs: vec![],
            exclude_dir_keywords: vec![],
            exclude_path_patterns: vec![],
            shortcuts: ShortcutConfig::default(),
            masking: MaskingConfig::default(),
            limits: ExtractLimits::default(),
            classify: ClassifyConfig::default(),
            version: VersionRules::default(),
            latest_map: LatestMapConfig::default(),
            hash_contents: false,
            summary_sentences: 3,
            keywords_topk: 15,
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a YAML file. The result still needs `validate()`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_yaml::from_str(&text)
            .map_err(|e| ScanError::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Add a root directory
    pub fn add_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// Set the extension allow-list
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.allowed_extensions = extensions;
        self
    }

    /// Set directory-name exclusion keywords
    pub fn with_exclude_dir_keywords(mut self, keywords: Vec<String>) -> Self {
        self.exclude_dir_keywords = keywords;
        self
    }

    /// Set the shortcut policy
    pub fn with_shortcuts(mut self, shortcuts: ShortcutConfig) -> Self {
        self.shortcuts = shortcuts;
        self
    }

    /// Enable content hashing in fingerprints
    pub fn with_hash_contents(mut self, hash: bool) -> Self {
        self.hash_contents = hash;
        self
    }

    /// Check structural validity and compile every configured pattern.
    /// Fails with `ScanError::Config` before any filesystem work starts.
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(ScanError::Config("no scan roots configured".to_string()));
        }
        if self.allowed_extensions.is_empty() {
            return Err(ScanError::Config("no allowed extensions configured".to_string()));
        }
        for pattern in self
            .exclude_path_patterns
            .iter()
            .chain(&self.classify.screen_id_patterns)
            .chain(self.masking.custom.iter().map(|r| &r.pattern))
        {
            Regex::new(pattern)
                .map_err(|e| ScanError::Config(format!("invalid pattern '{}': {}", pattern, e)))?;
        }
        Ok(())
    }
}

/// Shortcut / alias resolution policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    /// Resolve shortcut files at all
    pub enabled: bool,
    /// Enumerate directory targets as additional scan roots
    pub follow_dir_targets: bool,
    /// Accept targets outside every configured root
    pub allow_outside_roots: bool,
    /// Maximum shortcut-to-shortcut hops before the chain is rejected
    pub max_chain: usize,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            follow_dir_targets: true,
            allow_outside_roots: false,
            max_chain: 2,
        }
    }
}

/// One user-supplied redaction rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskRule {
    pub pattern: String,
    #[serde(default = "default_replacement")]
    pub replace: String,
}

fn default_replacement() -> String {
    "[REDACTED]".to_string()
}

/// Redaction toggles; each built-in pattern is independently switchable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingConfig {
    pub email: bool,
    pub phone: bool,
    pub ip: bool,
    pub password_like: bool,
    /// Extra pattern/replacement pairs applied after the built-ins
    pub custom: Vec<MaskRule>,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            email: true,
            phone: true,
            ip: true,
            password_like: true,
            custom: vec![],
        }
    }
}

/// Bounds on what extraction may retain. Keeping these small is the
/// security property: the full document body never leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractLimits {
    pub max_extract_chars: usize,
    pub max_headings: usize,
    pub max_preview_paragraphs: usize,
    pub max_preview_cells: usize,
    pub max_preview_slides: usize,
    pub max_pdf_pages: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_extract_chars: 8000,
            max_headings: 40,
            max_preview_paragraphs: 12,
            max_preview_cells: 80,
            max_preview_slides: 30,
            max_pdf_pages: 10,
        }
    }
}

/// One doc_type rule: first rule whose keyword appears wins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocTypeRule {
    pub contains_any: Vec<String>,
    pub doc_type: String,
}

/// Rules for inferring the logical document identity from paths and
/// filenames. Identity is never inferred from file content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Take the system name from a path component under the root
    pub system_from_path: bool,
    /// 1-based component depth below the nearest root
    pub system_depth: usize,
    /// First capture group of the first matching pattern is the screen id
    pub screen_id_patterns: Vec<String>,
    pub doc_type_rules: Vec<DocTypeRule>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            system_from_path: true,
            system_depth: 1,
            screen_id_patterns: vec![],
            doc_type_rules: vec![],
        }
    }
}

/// Which filename version markers participate in ordering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionRules {
    pub date: bool,
    pub semver: bool,
    pub revision: bool,
}

impl Default for VersionRules {
    fn default() -> Self {
        Self {
            date: true,
            semver: true,
            revision: true,
        }
    }
}

/// latest_map.md policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatestMapConfig {
    pub enabled: bool,
    /// Group partially classified documents under placeholder keys
    /// instead of dropping them from the map
    pub allow_fallback_keys: bool,
}

impl Default for LatestMapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_fallback_keys: true,
        }
    }
}
