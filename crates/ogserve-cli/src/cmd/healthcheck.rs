use crate::output::print_json;
use anyhow::Result;
use ogserve_core::config::RuntimeConfig;
use ogserve_core::probe::{self, ProbeOutcome, HEALTHZ_PATH};
use std::time::Duration;

/// One probe, one exit code. The container healthcheck calls this; anything
/// other than a 2xx answer inside the timeout exits non-zero.
pub fn run(url: Option<&str>, timeout_secs: u64, json: bool) -> Result<()> {
    let url = match url {
        Some(u) => u.to_string(),
        None => default_url()?,
    };
    let timeout = Duration::from_secs(timeout_secs);

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        let client = reqwest::Client::new();
        probe::probe_once(&client, &url, timeout).await
    });

    match outcome {
        ProbeOutcome::Pass => {
            if json {
                print_json(&serde_json::json!({ "url": url, "status": "pass" }))?;
            } else {
                println!("{url}: ok");
            }
            Ok(())
        }
        ProbeOutcome::Fail(reason) => anyhow::bail!("probe failed: {url}: {reason}"),
    }
}

/// The instance probes itself over loopback; the configured bind host is
/// usually 0.0.0.0 and never a dialable address.
fn default_url() -> Result<String> {
    let config = RuntimeConfig::from_env()?;
    Ok(format!("http://127.0.0.1:{}{}", config.port, HEALTHZ_PATH))
}
