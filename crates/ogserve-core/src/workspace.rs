use crate::config::RuntimeConfig;
use crate::error::{OgError, Result};
use crate::io;
use crate::paths;
use std::path::{Path, PathBuf};

/// On-disk layout the service needs before it can serve: `generated/` for
/// rendered cards and `assets/` for fonts and source imagery.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub generated: PathBuf,
    pub assets: PathBuf,
}

impl Workspace {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            generated: paths::generated_dir(root),
            assets: paths::assets_dir(root),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(&config.root)
    }

    /// Create both directories if absent and prove each accepts writes from
    /// the runtime account. Idempotent, runs on every boot.
    pub fn prepare(&self) -> Result<()> {
        for dir in [&self.generated, &self.assets] {
            io::ensure_dir(dir).map_err(|_| OgError::WorkspaceNotWritable(dir.clone()))?;
            io::probe_writable(dir).map_err(|_| OgError::WorkspaceNotWritable(dir.clone()))?;
        }
        Ok(())
    }
}
