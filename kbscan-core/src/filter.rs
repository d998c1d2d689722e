//! Path eligibility filtering
//!
//! Decides which directories are descended into and which files are
//! candidates for extraction. Three layers, checked in order:
//! extension allow-list, directory-name exclusion (exact or keyword
//! substring), and whole-path regex exclusion.

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use regex::Regex;
use std::path::Path;

pub struct PathFilter {
    allowed_extensions: Vec<String>,
    exclude_dirs: Vec<String>,
    exclude_dir_keywords: Vec<String>,
    exclude_path: Vec<Regex>,
}

impl PathFilter {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let exclude_path = config
            .exclude_path_patterns
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| ScanError::Config(format!("invalid pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_dirs: config
                .exclude_dirs
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            exclude_dir_keywords: config
                .exclude_dir_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            exclude_path,
        })
    }

    /// Should traversal descend into this directory?
    pub fn is_dir_excluded(&self, name: &str, full_path: &Path) -> bool {
        let lower = name.to_lowercase();
        if self.exclude_dirs.contains(&lower) {
            return true;
        }
        if self.exclude_dir_keywords.iter().any(|kw| lower.contains(kw)) {
            return true;
        }
        self.path_excluded(full_path)
    }

    /// Case-insensitive extension check against the allow-list
    pub fn extension_allowed(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.allowed_extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }

    /// Whole-path regex exclusion
    pub fn path_excluded(&self, path: &Path) -> bool {
        if self.exclude_path.is_empty() {
            return false;
        }
        let text = path.to_string_lossy();
        self.exclude_path.iter().any(|rx| rx.is_match(&text))
    }

    /// Full eligibility check for a regular file
    pub fn is_file_eligible(&self, path: &Path) -> bool {
        self.extension_allowed(path) && !self.path_excluded(path)
    }
}
