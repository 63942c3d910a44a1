use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::entry::{CacheEntry, CacheStats};
use super::path::derive_relative_path;
use crate::api::ImageSource;
use crate::errors::{CacheError, CacheResult};
use crate::utils::fs::{read_json, write_atomic};

/// Name of the persisted key → entry index inside the cache directory
pub const INDEX_FILE_NAME: &str = "index.json";

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
}

/// Remote image key → local file cache
///
/// Entries never expire. A hit whose file has disappeared from disk is
/// treated as a miss and fetched again. Concurrent resolves of the same key
/// are not de-duplicated; both fetch and write complete copies of the same
/// bytes to the same path.
#[derive(Clone)]
pub struct ImageCache {
    cache_dir: PathBuf,
    source: Arc<dyn ImageSource>,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    counters: Arc<Counters>,
    // Serializes index snapshots so an older snapshot never lands last
    persist_lock: Arc<Mutex<()>>,
}

impl ImageCache {
    /// Open the cache rooted at `cache_dir`, loading any persisted index
    pub async fn open<P: AsRef<Path>>(
        cache_dir: P,
        source: Arc<dyn ImageSource>,
    ) -> CacheResult<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::io(&cache_dir, e))?;

        let index_path = cache_dir.join(INDEX_FILE_NAME);
        let entries = match read_json::<HashMap<String, CacheEntry>>(&index_path).await {
            Ok(Some(entries)) => entries,
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!(
                    "Discarding unreadable image cache index {}: {}",
                    index_path.display(),
                    e
                );
                HashMap::new()
            }
        };

        info!(
            "Image cache opened at {} with {} entries",
            cache_dir.display(),
            entries.len()
        );

        Ok(Self {
            cache_dir,
            source,
            entries: Arc::new(RwLock::new(entries)),
            counters: Arc::new(Counters::default()),
            persist_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Local path for `image_key`, fetching and storing it on a miss
    ///
    /// `None` resolves to `None` without any I/O.
    pub async fn resolve(&self, image_key: Option<&str>) -> CacheResult<Option<PathBuf>> {
        let Some(key) = image_key else {
            return Ok(None);
        };

        if let Some(path) = self.lookup(key).await {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Image cache hit for '{}'", key);
            return Ok(Some(path));
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Image cache miss for '{}'", key);

        let local_path = self.cache_dir.join(derive_relative_path(key)?);

        self.counters.fetches.fetch_add(1, Ordering::Relaxed);
        let bytes = self.source.fetch_image(key).await.map_err(|e| {
            self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
            CacheError::ImageFetchFailed {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;

        write_atomic(&local_path, &bytes)
            .await
            .map_err(|e| CacheError::io(&local_path, e))?;

        let entry = CacheEntry::new(key, local_path.clone(), &bytes);
        self.entries.write().await.insert(key.to_string(), entry);
        info!(
            "Cached image '{}' ({} bytes) at {}",
            key,
            bytes.len(),
            local_path.display()
        );

        if let Err(e) = self.persist_index().await {
            warn!("Failed to persist image cache index: {}", e);
        }

        Ok(Some(local_path))
    }

    /// Display-oriented resolve: failures are logged and become `None`
    pub async fn resolve_or_placeholder(&self, image_key: Option<&str>) -> Option<PathBuf> {
        match self.resolve(image_key).await {
            Ok(path) => path,
            Err(e) => {
                warn!("Showing placeholder for image: {}", e);
                None
            }
        }
    }

    /// Resolve several keys concurrently, preserving input order
    pub async fn resolve_many<S: AsRef<str>>(&self, keys: &[Option<S>]) -> Vec<Option<PathBuf>> {
        join_all(
            keys.iter()
                .map(|key| self.resolve_or_placeholder(key.as_ref().map(|k| k.as_ref()))),
        )
        .await
    }

    /// Stored entry whose file is still on disk
    async fn lookup(&self, key: &str) -> Option<PathBuf> {
        let path = self.entries.read().await.get(key)?.local_path.clone();
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Some(path),
            _ => {
                debug!("Cached file for '{}' is gone: {}", key, path.display());
                None
            }
        }
    }

    pub async fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            fetch_failures: self.counters.fetch_failures.load(Ordering::Relaxed),
        }
    }

    /// Write the current index to `index.json`
    pub async fn persist_index(&self) -> CacheResult<()> {
        let _guard = self.persist_lock.lock().await;
        let snapshot = serde_json::to_vec_pretty(&*self.entries.read().await)?;
        let index_path = self.cache_dir.join(INDEX_FILE_NAME);
        write_atomic(&index_path, &snapshot)
            .await
            .map_err(|e| CacheError::io(&index_path, e))
    }
}
