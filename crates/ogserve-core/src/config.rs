use crate::cache::CacheStrategy;
use crate::error::{OgError, Result};
use crate::paths;
use crate::probe::PROBE_TIMEOUT_SECS;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Environment variable names
// ---------------------------------------------------------------------------

pub const ENV_HOST: &str = "OGSERVE_HOST";
pub const ENV_PORT: &str = "OGSERVE_PORT";
pub const ENV_ROOT: &str = "OGSERVE_ROOT";
pub const ENV_CACHE: &str = "OGSERVE_CACHE";
pub const ENV_CACHE_TTL_SECS: &str = "OGSERVE_CACHE_TTL_SECS";
pub const ENV_NEWS_DIR: &str = "OGSERVE_NEWS_DIR";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "OGSERVE_FETCH_TIMEOUT_SECS";
pub const ENV_ALLOW_ROOT: &str = "OGSERVE_ALLOW_ROOT";
pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
pub const ENV_SLACK_USER_TAG: &str = "SLACK_USER_TAG";

// ---------------------------------------------------------------------------
// RuntimeConfig
// ---------------------------------------------------------------------------

/// Everything the process reads from its environment, parsed once at startup.
/// Handlers and services receive this struct; nothing else consults env vars.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeConfig {
    pub host: String,
    pub port: u16,
    pub root: PathBuf,
    pub cache: CacheStrategy,
    pub cache_ttl_secs: u64,
    pub news_dir: PathBuf,
    pub fetch_timeout_secs: u64,
    pub allow_root: bool,
    pub slack_webhook_url: Option<String>,
    pub slack_user_tag: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cache_ttl_secs() -> u64 {
    120
}

fn default_fetch_timeout_secs() -> u64 {
    5
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let root = PathBuf::from(".");
        let news_dir = paths::default_news_dir(&root);
        Self {
            host: default_host(),
            port: default_port(),
            root,
            cache: CacheStrategy::Disk,
            cache_ttl_secs: default_cache_ttl_secs(),
            news_dir,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            allow_root: false,
            slack_webhook_url: None,
            slack_user_tag: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source. Blank values are
    /// treated as unset. Unparsable values are hard errors, not defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get(ENV_HOST).unwrap_or_else(default_host);
        let port = match get(ENV_PORT) {
            Some(raw) => parse_num::<u16>(ENV_PORT, &raw)?,
            None => default_port(),
        };
        let root = get(ENV_ROOT)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let cache = match get(ENV_CACHE) {
            Some(raw) => raw.parse::<CacheStrategy>()?,
            None => CacheStrategy::Disk,
        };
        let cache_ttl_secs = match get(ENV_CACHE_TTL_SECS) {
            Some(raw) => parse_nonzero(ENV_CACHE_TTL_SECS, &raw)?,
            None => default_cache_ttl_secs(),
        };
        let news_dir = get(ENV_NEWS_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| paths::default_news_dir(&root));
        let fetch_timeout_secs = match get(ENV_FETCH_TIMEOUT_SECS) {
            Some(raw) => parse_nonzero(ENV_FETCH_TIMEOUT_SECS, &raw)?,
            None => default_fetch_timeout_secs(),
        };
        let allow_root = match get(ENV_ALLOW_ROOT) {
            Some(raw) => parse_bool(ENV_ALLOW_ROOT, &raw)?,
            None => false,
        };

        Ok(Self {
            host,
            port,
            root,
            cache,
            cache_ttl_secs,
            news_dir,
            fetch_timeout_secs,
            allow_root,
            slack_webhook_url: get(ENV_SLACK_WEBHOOK_URL),
            slack_user_tag: get(ENV_SLACK_USER_TAG),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn generated_dir(&self) -> PathBuf {
        paths::generated_dir(&self.root)
    }

    pub fn assets_dir(&self) -> PathBuf {
        paths::assets_dir(&self.root)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Non-fatal checks on an already-parsed config. Hard failures (bad
    /// numbers, unknown strategies) never get this far.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.cache == CacheStrategy::None {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "caching is disabled; every request re-renders its card".to_string(),
            });
        }

        if self.cache != CacheStrategy::None && self.cache_ttl_secs < 30 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "cache TTL of {}s is unusually low; cards will be re-rendered often",
                    self.cache_ttl_secs
                ),
            });
        }

        if self.fetch_timeout_secs >= PROBE_TIMEOUT_SECS {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "background fetch timeout of {}s can exceed the {}s health probe timeout",
                    self.fetch_timeout_secs, PROBE_TIMEOUT_SECS
                ),
            });
        }

        if self.port < 1024 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "port {} is privileged and cannot be bound by the unprivileged runtime account",
                    self.port
                ),
            });
        }

        if self.allow_root {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "root execution override is enabled".to_string(),
            });
        }

        if let Some(url) = &self.slack_webhook_url {
            if !url.starts_with("https://") {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "Slack webhook URL does not use https".to_string(),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Parse helpers
// ---------------------------------------------------------------------------

fn parse_num<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|_| OgError::ConfigVar {
        name: name.to_string(),
        reason: format!("'{raw}' is not a valid number"),
    })
}

fn parse_nonzero(name: &str, raw: &str) -> Result<u64> {
    let value: u64 = parse_num(name, raw)?;
    if value == 0 {
        return Err(OgError::ConfigVar {
            name: name.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(OgError::ConfigVar {
            name: name.to_string(),
            reason: format!("'{raw}' is not a valid boolean"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
