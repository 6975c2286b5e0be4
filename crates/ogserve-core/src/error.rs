use thiserror::Error;

#[derive(Debug, Error)]
pub enum OgError {
    #[error("news not found: {0}")]
    NewsNotFound(String),

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("invalid cache strategy '{0}': expected none, memory or disk")]
    InvalidCacheStrategy(String),

    #[error("invalid template kind: {0}")]
    InvalidTemplateKind(String),

    #[error("invalid configuration value for {name}: {reason}")]
    ConfigVar { name: String, reason: String },

    #[error("refusing to run as root: set OGSERVE_ALLOW_ROOT=true to override")]
    RunningAsRoot,

    #[error("workspace directory not writable: {}", .0.display())]
    WorkspaceNotWritable(std::path::PathBuf),

    #[error("news store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("render failed for '{slug}': {reason}")]
    RenderFailed { slug: String, reason: String },

    #[error("notification channel not registered: {0}")]
    ChannelNotRegistered(String),

    #[error("notification delivery failed: {0}")]
    NotifyFailed(String),

    #[error("image fetch failed: {0}")]
    FetchFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, OgError>;
