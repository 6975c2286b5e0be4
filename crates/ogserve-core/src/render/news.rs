use crate::error::{OgError, Result};
use crate::fetch::{FetchedImage, ImageFetcher};
use crate::news::NewsArticle;
use crate::paths;
use crate::render::layout;
use crate::render::{CardTemplate, TemplateKind};
use crate::resources::AssetCatalog;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt::Write as _;
use std::sync::Arc;

const HEADLINE_FAMILY: &str = "Source Sans 3";
const FALLBACK_FAMILIES: &str = "'Helvetica Neue', Arial, sans-serif";

/// The news card: article image as a full-bleed background, a black fade
/// over the bottom two fifths, the headline centered inside the fade and an
/// optional brand mark in the top-left corner.
pub struct NewsCard {
    fetcher: ImageFetcher,
    assets: Arc<AssetCatalog>,
}

impl NewsCard {
    pub fn new(fetcher: ImageFetcher, assets: Arc<AssetCatalog>) -> Self {
        Self { fetcher, assets }
    }

    fn compose(
        &self,
        article: &NewsArticle,
        background: Option<&FetchedImage>,
        font: Option<&[u8]>,
    ) -> String {
        let title_px = layout::scale(layout::TITLE_FONT_UNITS);
        let brand_px = layout::scale(layout::BRAND_FONT_UNITS);
        let max_text_width = layout::CARD_WIDTH - layout::scale(layout::TEXT_MARGIN_UNITS);
        let fade_top = layout::fade_top();
        let fade_height = layout::fade_height();

        let family = if font.is_some() {
            format!("'{HEADLINE_FAMILY}', {FALLBACK_FAMILIES}")
        } else {
            FALLBACK_FAMILIES.to_string()
        };

        let mut svg = String::with_capacity(8 * 1024);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = layout::CARD_WIDTH,
            h = layout::CARD_HEIGHT,
        );

        svg.push_str("<defs>");
        svg.push_str(concat!(
            r#"<linearGradient id="fade" x1="0" y1="0" x2="0" y2="1">"#,
            r##"<stop offset="0" stop-color="#000000" stop-opacity="0"/>"##,
            r##"<stop offset="1" stop-color="#000000" stop-opacity="1"/>"##,
            "</linearGradient>",
        ));
        if let Some(bytes) = font {
            let _ = write!(
                svg,
                r#"<style>@font-face{{font-family:'{HEADLINE_FAMILY}';src:url(data:font/ttf;base64,{data}) format('truetype');font-weight:700;}}</style>"#,
                data = STANDARD.encode(bytes),
            );
        }
        svg.push_str("</defs>");

        let _ = write!(
            svg,
            r##"<rect width="{w}" height="{h}" fill="#000000"/>"##,
            w = layout::CARD_WIDTH,
            h = layout::CARD_HEIGHT,
        );

        // Background fills the canvas edge to edge, cropping the overflow.
        if let Some(image) = background {
            let _ = write!(
                svg,
                r#"<image href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="xMidYMid slice"/>"#,
                uri = image.data_uri(),
                w = layout::CARD_WIDTH,
                h = layout::CARD_HEIGHT,
            );
        }

        let _ = write!(
            svg,
            r#"<rect x="0" y="{top}" width="{w}" height="{fh}" fill="url(#fade)"/>"#,
            top = fade_top,
            w = layout::CARD_WIDTH,
            fh = fade_height,
        );

        let headline = layout::truncate_headline(&article.title);
        let lines = layout::wrap_text(&headline, title_px, max_text_width);
        let _ = write!(
            svg,
            r##"<g font-family="{family}" font-weight="700" font-size="{title_px}" fill="#ffffff" text-anchor="middle">"##,
        );
        let mut line_top = fade_top + layout::scale(layout::TEXT_OFFSET_UNITS);
        for line in &lines {
            // SVG anchors text at the baseline, the master layout at the top edge.
            let baseline = line_top + title_px * 9 / 10;
            let _ = write!(
                svg,
                r#"<text x="{x}" y="{baseline}">{text}</text>"#,
                x = layout::CARD_WIDTH / 2,
                text = layout::escape_xml(line),
            );
            line_top += layout::line_advance(title_px);
        }
        svg.push_str("</g>");

        if let Some(brand) = article.brand.as_deref().filter(|b| !b.trim().is_empty()) {
            let corner = layout::scale(layout::BRAND_POSITION_UNITS);
            let _ = write!(
                svg,
                r##"<text x="{x}" y="{y}" font-family="{family}" font-weight="500" font-size="{brand_px}" fill="#000000">{text}</text>"##,
                x = corner,
                y = corner + brand_px * 9 / 10,
                text = layout::escape_xml(brand.trim()),
            );
        }

        svg.push_str("</svg>");
        svg
    }
}

#[async_trait]
impl CardTemplate for NewsCard {
    fn kind(&self) -> TemplateKind {
        TemplateKind::News
    }

    async fn render(&self, article: &NewsArticle) -> Result<Vec<u8>> {
        let background = match self.fetcher.fetch(&article.image_url).await {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(
                    slug = %article.slug,
                    error = %e,
                    "background fetch failed, rendering plain card"
                );
                None
            }
        };

        let font = self
            .assets
            .load(paths::HEADLINE_FONT_FILE)
            .await
            .map_err(|e| OgError::RenderFailed {
                slug: article.slug.clone(),
                reason: format!("headline font: {e}"),
            })?;

        let svg = self.compose(
            article,
            background.as_ref(),
            font.as_deref().map(Vec::as_slice),
        );
        Ok(svg.into_bytes())
    }
}
