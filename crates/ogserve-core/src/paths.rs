use crate::error::{OgError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const GENERATED_DIR: &str = "generated";
pub const ASSETS_DIR: &str = "assets";
pub const NEWS_DIR: &str = "assets/news";

/// Bold face used for card headlines, looked up under the assets directory.
pub const HEADLINE_FONT_FILE: &str = "SourceSans3-Bold.ttf";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn generated_dir(root: &Path) -> PathBuf {
    root.join(GENERATED_DIR)
}

pub fn assets_dir(root: &Path) -> PathBuf {
    root.join(ASSETS_DIR)
}

pub fn default_news_dir(root: &Path) -> PathBuf {
    root.join(NEWS_DIR)
}

pub fn news_document(news_dir: &Path, slug: &str) -> PathBuf {
    news_dir.join(format!("{slug}.json"))
}

pub fn cached_card(generated_dir: &Path, key: &str) -> PathBuf {
    generated_dir.join(format!("{key}.svg"))
}

pub fn headline_font(assets_dir: &Path) -> PathBuf {
    assets_dir.join(HEADLINE_FONT_FILE)
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Article slugs double as cache keys and file names, so anything that could
/// escape the news or generated directories is rejected here.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 128 || !slug_re().is_match(slug) {
        return Err(OgError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
