use crate::error::Result;
use crate::paths;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// NewsArticle
// ---------------------------------------------------------------------------

/// A published article, the subject of a social card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub slug: String,
    pub title: String,
    /// Source image composited behind the headline.
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// NewsStore
// ---------------------------------------------------------------------------

/// Read-side port for article lookup. The HTTP surface and the CLI both go
/// through this seam, so the backing store can change without touching them.
#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<NewsArticle>>;

    /// Whether the backing store can currently answer lookups. Feeds the
    /// readiness flags; must return quickly.
    async fn is_reachable(&self) -> bool;
}

// ---------------------------------------------------------------------------
// FileNewsStore
// ---------------------------------------------------------------------------

/// Articles kept as one JSON document per slug under a directory.
pub struct FileNewsStore {
    dir: PathBuf,
}

impl FileNewsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl NewsStore for FileNewsStore {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<NewsArticle>> {
        let path = paths::news_document(&self.dir, slug);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let article: NewsArticle = serde_json::from_str(&data)?;
        Ok(Some(article))
    }

    async fn is_reachable(&self) -> bool {
        tokio::fs::metadata(&self.dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// MemoryNewsStore
// ---------------------------------------------------------------------------

/// Fixed set of articles held in memory. Backs unit tests and offline
/// rendering where no news directory exists.
#[derive(Default)]
pub struct MemoryNewsStore {
    articles: HashMap<String, NewsArticle>,
}

impl MemoryNewsStore {
    pub fn new(articles: impl IntoIterator<Item = NewsArticle>) -> Self {
        Self {
            articles: articles
                .into_iter()
                .map(|a| (a.slug.clone(), a))
                .collect(),
        }
    }
}

#[async_trait]
impl NewsStore for MemoryNewsStore {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<NewsArticle>> {
        Ok(self.articles.get(slug).cloned())
    }

    async fn is_reachable(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
