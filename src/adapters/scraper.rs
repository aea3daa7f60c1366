//! Page scraper service client.
//!
//! Headless-browser scraping lives in an external service; this adapter
//! only speaks its narrow contract: one URL in, ordered image references
//! plus the page's substantial text out.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ScraperSettings;
use crate::domain::ScrapedPage;

use super::PageScraper;

/// Client for the external headless-browser scrape service.
pub struct ScraperClient {
    settings: ScraperSettings,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(rename = "rawText", default)]
    raw_text: String,
    category: Option<String>,
}

impl ScraperClient {
    pub fn new(settings: ScraperSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client for scraper service")?;

        Ok(Self { settings, client })
    }

    fn scrape_url(&self) -> String {
        format!("{}/scrape", self.settings.base_url)
    }
}

#[async_trait]
impl PageScraper for ScraperClient {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        let response = self
            .client
            .post(self.scrape_url())
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .with_context(|| format!("Scrape request failed for {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Scraper service returned {}", response.status());
        }

        let decoded: ScrapeResponse = response
            .json()
            .await
            .context("Failed to decode scraper response")?;

        Ok(ScrapedPage {
            images: decoded.images,
            raw_text: decoded.raw_text,
            category: decoded.category,
        })
    }
}
