use crate::error::{OgError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Downloaded background image plus the MIME type to embed it under.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl FetchedImage {
    /// `data:` URI form for inlining into a rendered card.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Downloads article imagery with a short per-request timeout. A slow or
/// broken image host must never stall card delivery; callers treat any
/// failure here as "render without a background".
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ImageFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| OgError::FetchFailed(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OgError::FetchFailed(format!("{url} returned {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| guess_content_type(url));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| OgError::FetchFailed(format!("{url}: {e}")))?;
        if bytes.is_empty() {
            return Err(OgError::FetchFailed(format!("{url} returned an empty body")));
        }

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// Content type from the URL's file extension, for hosts that send no header.
fn guess_content_type(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .filter(|m| m.starts_with("image/"))
        .unwrap_or_else(|| "image/jpeg".to_string())
}
