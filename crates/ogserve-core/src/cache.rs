use crate::error::{OgError, Result};
use crate::io;
use crate::paths;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// CacheStrategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    None,
    Memory,
    Disk,
}

impl CacheStrategy {
    pub fn all() -> &'static [CacheStrategy] {
        &[CacheStrategy::None, CacheStrategy::Memory, CacheStrategy::Disk]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CacheStrategy::None => "none",
            CacheStrategy::Memory => "memory",
            CacheStrategy::Disk => "disk",
        }
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CacheStrategy {
    type Err = OgError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CacheStrategy::None),
            "memory" => Ok(CacheStrategy::Memory),
            "disk" => Ok(CacheStrategy::Disk),
            _ => Err(OgError::InvalidCacheStrategy(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ImageCache
// ---------------------------------------------------------------------------

/// Cache of rendered card bytes keyed by `{kind}_{slug}`. Entries are only
/// served while fresh; stale entries are overwritten on the next render, so
/// no backend needs an eviction pass.
#[async_trait]
pub trait ImageCache: Send + Sync {
    /// Fresh bytes for `key`, or None on miss or staleness.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Drop every entry this backend holds.
    async fn clear(&self) -> Result<usize>;
}

/// Backend for the configured strategy.
pub fn build_cache(
    strategy: CacheStrategy,
    generated_dir: PathBuf,
    ttl: Duration,
) -> Arc<dyn ImageCache> {
    match strategy {
        CacheStrategy::None => Arc::new(NoopCache),
        CacheStrategy::Memory => Arc::new(MemoryCache::new(ttl)),
        CacheStrategy::Disk => Arc::new(DiskCache::new(generated_dir, ttl)),
    }
}

// ---------------------------------------------------------------------------
// NoopCache
// ---------------------------------------------------------------------------

/// Caching disabled: every get misses, every put is dropped.
pub struct NoopCache;

#[async_trait]
impl ImageCache for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<usize> {
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

/// Process-local cache. Lost on restart, which suits single-instance
/// deployments where the disk is ephemeral anyway.
pub struct MemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ImageCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some((bytes, stored_at)) if stored_at.elapsed() < self.ttl => {
                Ok(Some(bytes.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), (bytes.to_vec(), Instant::now()));
        Ok(())
    }

    async fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        entries.clear();
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// DiskCache
// ---------------------------------------------------------------------------

/// Cards as `{key}.svg` files under `generated/`. Freshness comes from the
/// file's mtime, so entries survive restarts and `clear` is just a sweep of
/// the directory.
pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    pub fn new(dir: PathBuf, ttl: Duration) -> Self {
        Self { dir, ttl }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        paths::cached_card(&self.dir, key)
    }

    fn is_fresh(&self, path: &std::path::Path) -> bool {
        let Ok(meta) = std::fs::metadata(path) else {
            return false;
        };
        let Ok(mtime) = meta.modified() else {
            return false;
        };
        match SystemTime::now().duration_since(mtime) {
            Ok(age) => age < self.ttl,
            // mtime in the future counts as fresh; clock skew, not staleness.
            Err(_) => true,
        }
    }
}

#[async_trait]
impl ImageCache for DiskCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        if !self.is_fresh(&path) {
            return Ok(None);
        }
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        io::atomic_write(&self.entry_path(key), bytes)
    }

    async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("svg") {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
