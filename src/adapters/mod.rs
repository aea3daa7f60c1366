//! Collaborator interfaces for external systems.
//!
//! Each generative-AI capability the pipeline consumes is one narrow
//! trait with a normalized request/response contract, so the core never
//! branches on provider-specific shapes. Concrete adapters talk to the
//! backends over HTTP and are constructed from explicit configuration.

pub mod fetch;
pub mod gemini;
pub mod marketer;
pub mod scraper;
pub mod video;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::domain::{FetchedCandidate, InsightDigest, ProductSummary, RankOutcome, ScrapedPage};

// Re-export the concrete adapters
pub use fetch::HttpImageFetcher;
pub use gemini::GeminiClient;
pub use marketer::MarketerClient;
pub use scraper::ScraperClient;
pub use video::VeoClient;

/// Headless-browser page scraping (external service).
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage>;
}

/// Text-generation capabilities: distillation, research prompts, scripts.
#[async_trait]
pub trait CopyEngine: Send + Sync {
    /// Distill raw scraped text into a product summary.
    ///
    /// Always returns a usable struct: on any transport or decode
    /// failure the adapter substitutes a degraded summary built from the
    /// raw text rather than propagating the error.
    async fn distill_product(&self, raw_text: &str) -> ProductSummary;

    /// Derive the trend-research prompt from a product summary.
    async fn research_prompt(&self, product: &ProductSummary) -> Result<String>;

    /// Derive a short-form video script from the insights and summary.
    async fn write_script(
        &self,
        insights: &InsightDigest,
        product: &ProductSummary,
    ) -> Result<String>;
}

/// Marketing-insights research keyed by a fresh session id per call.
#[async_trait]
pub trait InsightsSource: Send + Sync {
    async fn fetch_insights(
        &self,
        prompt: &str,
        session_id: u32,
        platform: &str,
    ) -> Result<InsightDigest>;
}

/// Vision and image-generation capabilities used by the selector.
#[async_trait]
pub trait ImageEngine: Send + Sync {
    /// Rank the fetched candidates under the disqualification policy.
    async fn rank_candidates(
        &self,
        candidates: &[FetchedCandidate],
        description: &str,
    ) -> Result<RankOutcome>;

    /// Second, independent accept/reject check on a single candidate.
    async fn validate_clarity(
        &self,
        candidate: &FetchedCandidate,
        description: &str,
    ) -> Result<bool>;

    /// Synthesize a new product image, returning its reference.
    async fn synthesize(&self, prompt: &str) -> Result<String>;
}

/// Resolution of an image reference to its binary content.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>>;
}

/// Video generation. One blocking call from the pipeline's perspective,
/// however long the backend takes.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn render(
        &self,
        image: Option<&str>,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<String>;
}

/// The full set of collaborators a campaign run needs.
#[derive(Clone)]
pub struct Services {
    pub scraper: Arc<dyn PageScraper>,
    pub copy: Arc<dyn CopyEngine>,
    pub insights: Arc<dyn InsightsSource>,
    pub images: Arc<dyn ImageEngine>,
    pub fetcher: Arc<dyn ImageFetcher>,
    pub video: Arc<dyn VideoRenderer>,
}

impl Services {
    /// Construct the concrete HTTP adapters from resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let gemini = Arc::new(GeminiClient::new(config.gemini.clone(), &config.media_dir)?);
        Ok(Self {
            scraper: Arc::new(ScraperClient::new(config.scraper.clone())?),
            copy: gemini.clone(),
            insights: Arc::new(MarketerClient::new(config.marketer.clone())?),
            images: gemini,
            fetcher: Arc::new(HttpImageFetcher::new(config.fetch.clone())?),
            video: Arc::new(VeoClient::new(config.video.clone(), &config.media_dir)?),
        })
    }
}
