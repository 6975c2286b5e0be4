use crate::output::print_json;
use anyhow::Result;
use clap::Subcommand;
use ogserve_core::cache::build_cache;
use ogserve_core::config::RuntimeConfig;

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// Drop every cached card for the configured strategy
    Clear,
}

pub fn run(subcommand: CacheSubcommand, json: bool) -> Result<()> {
    match subcommand {
        CacheSubcommand::Clear => clear(json),
    }
}

/// Only the disk cache outlives a process, so this mostly exists to sweep
/// generated/ between deploys. Memory caches die with their server.
fn clear(json: bool) -> Result<()> {
    let config = RuntimeConfig::from_env()?;
    let cache = build_cache(config.cache, config.generated_dir(), config.cache_ttl());

    let rt = tokio::runtime::Runtime::new()?;
    let dropped = rt.block_on(cache.clear())?;

    if json {
        print_json(&serde_json::json!({ "dropped": dropped }))?;
    } else {
        println!("Dropped {dropped} cached cards.");
    }
    Ok(())
}
