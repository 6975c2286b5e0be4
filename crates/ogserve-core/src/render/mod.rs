pub mod layout;
mod news;

pub use news::NewsCard;

use crate::cache::{build_cache, ImageCache};
use crate::config::RuntimeConfig;
use crate::error::{OgError, Result};
use crate::fetch::ImageFetcher;
use crate::news::NewsArticle;
use crate::resources::AssetCatalog;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// MIME type of every rendered card.
pub const CARD_CONTENT_TYPE: &str = "image/svg+xml";

// ---------------------------------------------------------------------------
// TemplateKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    News,
}

impl TemplateKind {
    pub fn all() -> &'static [TemplateKind] {
        &[TemplateKind::News]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKind::News => "news",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = OgError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "news" => Ok(TemplateKind::News),
            _ => Err(OgError::InvalidTemplateKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// CardTemplate / TemplateFactory
// ---------------------------------------------------------------------------

/// One card design. Implementations own the whole composition, including
/// fetching whatever imagery the design calls for.
#[async_trait]
pub trait CardTemplate: Send + Sync {
    fn kind(&self) -> TemplateKind;

    async fn render(&self, article: &NewsArticle) -> Result<Vec<u8>>;
}

/// Hands out templates wired to the shared fetcher and asset catalog.
pub struct TemplateFactory {
    fetcher: ImageFetcher,
    assets: Arc<AssetCatalog>,
}

impl TemplateFactory {
    pub fn new(fetcher: ImageFetcher, assets: Arc<AssetCatalog>) -> Self {
        Self { fetcher, assets }
    }

    pub fn create(&self, kind: TemplateKind) -> Arc<dyn CardTemplate> {
        match kind {
            TemplateKind::News => {
                Arc::new(NewsCard::new(self.fetcher.clone(), self.assets.clone()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// OgImageService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub from_cache: bool,
}

/// Cache-then-render front for card generation. The only way the HTTP
/// surface and the CLI produce cards.
pub struct OgImageService {
    factory: TemplateFactory,
    cache: Arc<dyn ImageCache>,
    assets: Arc<AssetCatalog>,
}

impl OgImageService {
    pub fn new(factory: TemplateFactory, cache: Arc<dyn ImageCache>) -> Self {
        let assets = factory.assets.clone();
        Self {
            factory,
            cache,
            assets,
        }
    }

    /// Standard wiring from a parsed config and a shared HTTP client.
    pub fn from_config(config: &RuntimeConfig, client: reqwest::Client) -> Self {
        let fetcher = ImageFetcher::new(client, config.fetch_timeout());
        let assets = Arc::new(AssetCatalog::new(config.assets_dir()));
        let factory = TemplateFactory::new(fetcher, assets);
        let cache = build_cache(config.cache, config.generated_dir(), config.cache_ttl());
        Self::new(factory, cache)
    }

    pub fn cache_key(kind: TemplateKind, slug: &str) -> String {
        format!("{}_{}", kind.as_str(), slug)
    }

    pub fn asset_catalog(&self) -> Arc<AssetCatalog> {
        self.assets.clone()
    }

    /// Serve `kind` for `article`, from cache when fresh unless `force`
    /// demands a re-render.
    pub async fn generate(
        &self,
        kind: TemplateKind,
        article: &NewsArticle,
        force: bool,
    ) -> Result<RenderedCard> {
        let key = Self::cache_key(kind, &article.slug);

        if !force {
            if let Some(bytes) = self.cache.get(&key).await? {
                tracing::debug!(key, "serving cached card");
                return Ok(RenderedCard {
                    bytes,
                    content_type: CARD_CONTENT_TYPE,
                    from_cache: true,
                });
            }
        }

        let template = self.factory.create(kind);
        let bytes = template.render(article).await?;
        self.cache.put(&key, &bytes).await?;
        tracing::info!(key, size = bytes.len(), "card rendered");

        Ok(RenderedCard {
            bytes,
            content_type: CARD_CONTENT_TYPE,
            from_cache: false,
        })
    }

    pub async fn clear_cache(&self) -> Result<usize> {
        self.cache.clear().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStrategy, MemoryCache, NoopCache};
    use std::time::Duration;
    use tempfile::TempDir;

    fn service(dir: &TempDir, cache: Arc<dyn ImageCache>) -> OgImageService {
        let fetcher = ImageFetcher::new(reqwest::Client::new(), Duration::from_secs(1));
        let assets = Arc::new(AssetCatalog::new(dir.path()));
        OgImageService::new(TemplateFactory::new(fetcher, assets), cache)
    }

    fn offline_article(slug: &str) -> NewsArticle {
        NewsArticle {
            slug: slug.to_string(),
            title: "Cup final goes to penalties".to_string(),
            // unreachable on purpose; the card falls back to a plain canvas
            image_url: "http://127.0.0.1:9/final.jpg".to_string(),
            brand: None,
            published_at: None,
        }
    }

    #[test]
    fn template_kind_round_trip() {
        for kind in TemplateKind::all() {
            assert_eq!(kind.as_str().parse::<TemplateKind>().unwrap(), *kind);
        }
        assert!("poster".parse::<TemplateKind>().is_err());
    }

    #[test]
    fn cache_key_prefixes_kind() {
        assert_eq!(
            OgImageService::cache_key(TemplateKind::News, "cup-final"),
            "news_cup-final"
        );
    }

    #[tokio::test]
    async fn second_generate_hits_the_cache() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, Arc::new(MemoryCache::new(Duration::from_secs(60))));
        let article = offline_article("cup-final");

        let first = svc.generate(TemplateKind::News, &article, false).await.unwrap();
        assert!(!first.from_cache);

        let second = svc.generate(TemplateKind::News, &article, false).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(first.bytes, second.bytes);
    }

    #[tokio::test]
    async fn force_bypasses_the_cache() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, Arc::new(MemoryCache::new(Duration::from_secs(60))));
        let article = offline_article("cup-final");

        svc.generate(TemplateKind::News, &article, false).await.unwrap();
        let forced = svc.generate(TemplateKind::News, &article, true).await.unwrap();
        assert!(!forced.from_cache);
    }

    #[tokio::test]
    async fn disabled_cache_always_re_renders() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, Arc::new(NoopCache));
        let article = offline_article("cup-final");

        let first = svc.generate(TemplateKind::News, &article, false).await.unwrap();
        let second = svc.generate(TemplateKind::News, &article, false).await.unwrap();
        assert!(!first.from_cache);
        assert!(!second.from_cache);
    }

    #[tokio::test]
    async fn rendered_card_is_svg() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, Arc::new(NoopCache));
        let card = svc
            .generate(TemplateKind::News, &offline_article("cup-final"), false)
            .await
            .unwrap();
        assert_eq!(card.content_type, "image/svg+xml");
        assert!(String::from_utf8(card.bytes).unwrap().starts_with("<svg"));
    }

    #[tokio::test]
    async fn from_config_wires_the_disk_cache() {
        let dir = TempDir::new().unwrap();
        let cfg = RuntimeConfig {
            root: dir.path().to_path_buf(),
            cache: CacheStrategy::Disk,
            ..RuntimeConfig::default()
        };
        std::fs::create_dir_all(cfg.generated_dir()).unwrap();
        let svc = OgImageService::from_config(&cfg, reqwest::Client::new());

        svc.generate(TemplateKind::News, &offline_article("cup-final"), false)
            .await
            .unwrap();
        assert!(dir.path().join("generated/news_cup-final.svg").exists());

        assert_eq!(svc.clear_cache().await.unwrap(), 1);
        assert!(!dir.path().join("generated/news_cup-final.svg").exists());
    }
}
