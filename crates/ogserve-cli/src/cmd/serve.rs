use anyhow::Result;
use ogserve_core::config::{RuntimeConfig, WarnLevel};

/// Foreground server. Env config first, then the CLI overrides on top.
pub fn run(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = RuntimeConfig::from_env()?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => tracing::warn!("{}", w.message),
            WarnLevel::Error => tracing::error!("{}", w.message),
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(ogserve_server::serve(config))
}
