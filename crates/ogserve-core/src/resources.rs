use crate::error::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Most asset files held in memory at once.
pub const MAX_CACHED_ASSETS: usize = 5;

/// How long a loaded asset stays valid before it is re-read from disk.
pub const ASSET_TTL: Duration = Duration::from_secs(120);

/// How often the background sweep evicts expired assets.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

struct CatalogEntry {
    bytes: Arc<Vec<u8>>,
    loaded_at: Instant,
}

/// Small bounded cache over files in the assets directory. Fonts and shared
/// imagery are read once and reused across renders; the bound keeps a burst
/// of distinct assets from pinning memory.
pub struct AssetCatalog {
    assets_dir: PathBuf,
    capacity: usize,
    ttl: Duration,
    entries: Mutex<HashMap<String, CatalogEntry>>,
}

impl AssetCatalog {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self::with_limits(assets_dir, MAX_CACHED_ASSETS, ASSET_TTL)
    }

    pub fn with_limits(assets_dir: impl Into<PathBuf>, capacity: usize, ttl: Duration) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            capacity,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn assets_dir(&self) -> &std::path::Path {
        &self.assets_dir
    }

    /// Bytes of `name` under the assets directory. Missing files are not an
    /// error; callers fall back to built-in defaults.
    pub async fn load(&self, name: &str) -> Result<Option<Arc<Vec<u8>>>> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(name) {
            if entry.loaded_at.elapsed() < self.ttl {
                return Ok(Some(entry.bytes.clone()));
            }
        }

        let path = self.assets_dir.join(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => Arc::new(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                entries.remove(name);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        // Make room before inserting; the stalest entry goes first.
        while entries.len() >= self.capacity && !entries.contains_key(name) {
            let Some(stalest) = entries
                .iter()
                .min_by_key(|(_, e)| e.loaded_at)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            entries.remove(&stalest);
        }

        entries.insert(
            name.to_string(),
            CatalogEntry {
                bytes: bytes.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(Some(bytes))
    }

    /// Evict entries past their TTL. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, e| e.loaded_at.elapsed() < ttl);
        before - entries.len()
    }

    /// Drop everything, used on shutdown.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        entries.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
