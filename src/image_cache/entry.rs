//! Persisted image cache entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Mapping from an image key to the local copy of its bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    /// Absolute path of the cached file
    pub local_path: PathBuf,
    pub size: u64,
    /// Hex SHA-256 of the bytes written
    pub sha256: String,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: &str, local_path: PathBuf, bytes: &[u8]) -> Self {
        Self {
            key: key.to_string(),
            local_path,
            size: bytes.len() as u64,
            sha256: hex::encode(Sha256::digest(bytes)),
            cached_at: Utc::now(),
        }
    }

    /// Whether `bytes` are exactly what this entry recorded
    pub fn matches(&self, bytes: &[u8]) -> bool {
        self.size == bytes.len() as u64 && self.sha256 == hex::encode(Sha256::digest(bytes))
    }
}

/// Hit/miss/fetch counters since the cache was opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
}
