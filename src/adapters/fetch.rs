//! Image reference resolution.
//!
//! Fetches the binary content behind an image reference. Local paths are
//! read directly (synthesized images live on disk); anything else is
//! treated as a URL.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::FetchSettings;

use super::ImageFetcher;

/// Fetcher for candidate image bytes.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client for image fetching")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        if !reference.starts_with("http://") && !reference.starts_with("https://") {
            let bytes = tokio::fs::read(reference)
                .await
                .with_context(|| format!("Failed to read local image: {}", reference))?;
            return Ok(bytes);
        }

        let response = self
            .client
            .get(reference)
            .send()
            .await
            .with_context(|| format!("Image fetch failed: {}", reference))?
            .error_for_status()
            .with_context(|| format!("Image fetch rejected: {}", reference))?;

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read image bytes: {}", reference))?;

        Ok(bytes.to_vec())
    }
}
