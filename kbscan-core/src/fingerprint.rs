//! File fingerprints for change detection
//!
//! Two-tier signature: size + mtime is the fast check that covers the
//! common case; an optional SHA-256 content hash gives a stronger but
//! costlier guarantee when `hash_contents` is configured.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch
    pub mtime_epoch: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl FileFingerprint {
    pub fn from_path(path: &Path, compute_hash: bool) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let mtime_epoch = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let content_hash = if compute_hash {
            Some(hash_file(path)?)
        } else {
            None
        };

        Ok(Self {
            size: metadata.len(),
            mtime_epoch,
            content_hash,
        })
    }

    /// Equal fingerprints mean the file is treated as unchanged.
    /// Hashes are only compared when both sides carry one, so turning
    /// `hash_contents` on later does not invalidate the whole state.
    pub fn matches(&self, other: &Self) -> bool {
        if self.size != other.size || self.mtime_epoch != other.mtime_epoch {
            return false;
        }
        match (&self.content_hash, &other.content_hash) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

/// Streaming SHA-256 of a file, hex encoded
pub fn hash_file(path: &Path) -> Result<String> {
    const BUFFER_SIZE: usize = 1024 * 1024;

    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}
