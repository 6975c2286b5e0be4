use crate::output::print_json;
use anyhow::{Context, Result};
use ogserve_core::config::RuntimeConfig;
use ogserve_core::news::{FileNewsStore, NewsStore};
use ogserve_core::render::{OgImageService, TemplateKind};
use ogserve_core::{io, paths, OgError};
use std::path::Path;

/// Render one card straight to disk, same pipeline as the server route.
/// Useful for seeding a cache or eyeballing a card without a running
/// instance.
pub fn run(slug: &str, out: Option<&Path>, force: bool, json: bool) -> Result<()> {
    paths::validate_slug(slug)?;
    let config = RuntimeConfig::from_env()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let store = FileNewsStore::new(config.news_dir.clone());
        let article = store
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| OgError::NewsNotFound(slug.to_string()))?;

        let cards = OgImageService::from_config(&config, reqwest::Client::new());
        let card = cards.generate(TemplateKind::News, &article, force).await?;

        let path = match out {
            Some(path) => path.to_path_buf(),
            None => paths::cached_card(
                &config.generated_dir(),
                &OgImageService::cache_key(TemplateKind::News, slug),
            ),
        };
        io::atomic_write(&path, &card.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;

        if json {
            print_json(&serde_json::json!({
                "slug": slug,
                "path": path,
                "bytes": card.bytes.len(),
                "from_cache": card.from_cache,
            }))?;
        } else {
            println!("{} ({} bytes)", path.display(), card.bytes.len());
        }
        Ok(())
    })
}
