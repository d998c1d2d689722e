//! Persisted scan state and change detection
//!
//! The state file maps canonical path keys to the fingerprint and the
//! small document metadata captured on the last run. Loading fails
//! soft (missing or corrupt files yield an empty state); saving goes
//! through a temp file plus atomic rename so an interrupted run never
//! corrupts the previous state.

use crate::error::{Result, ScanError};
use crate::fingerprint::FileFingerprint;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Metadata persisted per document so an unchanged file can feed the
/// latest map without re-extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocMeta {
    pub doc_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    pub version_key: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEntry {
    /// Original (non-canonical) path, for reporting
    pub path: String,
    pub fingerprint: FileFingerprint,
    pub meta: DocMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// The persisted shape of `state.json`. BTreeMap keeps the output
/// stable so unchanged runs round-trip byte-identically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub files: BTreeMap<String, StateEntry>,
}

pub struct StateStore {
    path: PathBuf,
    previous: ScanState,
    current: ScanState,
}

impl StateStore {
    /// Load the previous state. Missing or unparsable files are not
    /// fatal; the run simply starts from an empty state.
    pub fn load(path: &Path) -> Self {
        let previous = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<ScanState>(&text) {
                Ok(state) => {
                    tracing::debug!("loaded state with {} entries", state.files.len());
                    state
                }
                Err(e) => {
                    tracing::warn!("state file {} unparsable, starting fresh: {}", path.display(), e);
                    ScanState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no previous state at {}", path.display());
                ScanState::default()
            }
            Err(e) => {
                tracing::warn!("state file {} unreadable, starting fresh: {}", path.display(), e);
                ScanState::default()
            }
        };

        Self {
            path: path.to_path_buf(),
            previous,
            current: ScanState::default(),
        }
    }

    pub fn previous_entry(&self, key: &str) -> Option<&StateEntry> {
        self.previous.files.get(key)
    }

    /// A file counts as changed when its key is new or its fingerprint
    /// no longer matches the stored one.
    pub fn is_changed(&self, key: &str, fingerprint: &FileFingerprint) -> bool {
        self.previous_entry(key)
            .map_or(true, |e| !e.fingerprint.matches(fingerprint))
    }

    pub fn record(&mut self, key: String, entry: StateEntry) {
        self.current.files.insert(key, entry);
    }

    /// Entries present on the last run but not recorded this run.
    /// Reported, never fatal.
    pub fn deleted(&self) -> Vec<&StateEntry> {
        self.previous
            .files
            .iter()
            .filter(|(key, _)| !self.current.files.contains_key(*key))
            .map(|(_, entry)| entry)
            .collect()
    }

    pub fn recorded(&self) -> usize {
        self.current.files.len()
    }

    /// Atomically persist the current state: serialize to `.tmp`, then
    /// rename over the old file. Any failure here is fatal.
    pub fn save(&mut self) -> Result<()> {
        self.current.generated_at = Some(Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string());

        let json = serde_json::to_string_pretty(&self.current)
            .map_err(|e| ScanError::StatePersist(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ScanError::StatePersist(format!("{}: {}", parent.display(), e)))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| ScanError::StatePersist(format!("{}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| ScanError::StatePersist(format!("{}: {}", self.path.display(), e)))?;

        tracing::info!("state saved: {} entries -> {}", self.current.files.len(), self.path.display());
        Ok(())
    }
}
