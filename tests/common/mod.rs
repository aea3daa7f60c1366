//! Mock collaborators shared by the integration tests.
//!
//! Each mock implements one capability trait with scriptable behavior
//! and records how it was called, so tests can assert both the terminal
//! envelope and which collaborators actually ran.

// Not every test file uses every mock.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use promogen::adapters::{
    CopyEngine, ImageEngine, ImageFetcher, InsightsSource, PageScraper, Services, VideoRenderer,
};
use promogen::domain::{
    FetchedCandidate, InsightDigest, ProductSummary, RankOutcome, ScrapedPage,
};

pub fn product_summary() -> ProductSummary {
    ProductSummary {
        product_name: "Acme Buds".to_string(),
        description: "Wireless earbuds, 30h battery, noise cancellation.".to_string(),
        category: "Audio".to_string(),
    }
}

#[derive(Default)]
pub struct MockScraper {
    pub images: Vec<String>,
    pub raw_text: String,
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl PageScraper for MockScraper {
    async fn scrape(&self, _url: &str) -> Result<ScrapedPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(ScrapedPage {
            images: self.images.clone(),
            raw_text: self.raw_text.clone(),
            category: None,
        })
    }
}

#[derive(Default)]
pub struct MockCopy {
    pub fail_script: bool,
}

#[async_trait]
impl CopyEngine for MockCopy {
    async fn distill_product(&self, _raw_text: &str) -> ProductSummary {
        product_summary()
    }

    async fn research_prompt(&self, product: &ProductSummary) -> Result<String> {
        Ok(format!(
            "Find me the most viral video in the product category {} and write a viral script",
            product.category
        ))
    }

    async fn write_script(
        &self,
        _insights: &InsightDigest,
        _product: &ProductSummary,
    ) -> Result<String> {
        if self.fail_script {
            anyhow::bail!("script backend unavailable");
        }
        Ok("[Scene 1]: Earbuds on marble (Audio: \"Stop scrolling\")\n[Scene 2]: Case snaps shut"
            .to_string())
    }
}

#[derive(Default)]
pub struct MockInsights {
    pub fail: bool,
    pub session_ids: Mutex<Vec<u32>>,
}

#[async_trait]
impl InsightsSource for MockInsights {
    async fn fetch_insights(
        &self,
        _prompt: &str,
        session_id: u32,
        _platform: &str,
    ) -> Result<InsightDigest> {
        if self.fail {
            anyhow::bail!("insights backend returned 500");
        }
        if let Ok(mut ids) = self.session_ids.lock() {
            ids.push(session_id);
        }
        Ok(InsightDigest {
            content: "Unboxing videos dominate this niche.".to_string(),
            ranked_references: vec!["Top unboxing".to_string()],
            external_video_urls: vec!["https://videos.example.com/v1".to_string()],
        })
    }
}

/// Scriptable ranking verdict.
pub enum RankBehavior {
    Pick(usize),
    NoneQualify,
    Fail,
}

/// Scriptable clarity-validation verdict.
pub enum ValidateBehavior {
    Pass,
    Reject,
    Fail,
}

pub struct MockImages {
    pub rank: RankBehavior,
    pub validate: ValidateBehavior,
    pub fail_synthesis: bool,
    pub rank_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    pub synthesis_calls: AtomicUsize,
}

impl Default for MockImages {
    fn default() -> Self {
        Self {
            rank: RankBehavior::Pick(0),
            validate: ValidateBehavior::Pass,
            fail_synthesis: false,
            rank_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
            synthesis_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageEngine for MockImages {
    async fn rank_candidates(
        &self,
        candidates: &[FetchedCandidate],
        _description: &str,
    ) -> Result<RankOutcome> {
        self.rank_calls.fetch_add(1, Ordering::SeqCst);
        match self.rank {
            RankBehavior::Pick(index) => {
                assert!(index < candidates.len(), "mock picked out-of-range index");
                Ok(RankOutcome {
                    best_index: Some(index),
                    reason: "Clean single-subject product shot.".to_string(),
                    synthesis_prompt: Some("Studio shot of wireless earbuds".to_string()),
                })
            }
            RankBehavior::NoneQualify => Ok(RankOutcome {
                best_index: None,
                reason: "All candidates are lifestyle shots or collages.".to_string(),
                synthesis_prompt: Some("Studio shot of wireless earbuds".to_string()),
            }),
            RankBehavior::Fail => anyhow::bail!("vision backend returned 429"),
        }
    }

    async fn validate_clarity(
        &self,
        _candidate: &FetchedCandidate,
        _description: &str,
    ) -> Result<bool> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        match self.validate {
            ValidateBehavior::Pass => Ok(true),
            ValidateBehavior::Reject => Ok(false),
            ValidateBehavior::Fail => anyhow::bail!("vision backend timed out"),
        }
    }

    async fn synthesize(&self, _prompt: &str) -> Result<String> {
        self.synthesis_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_synthesis {
            anyhow::bail!("image synthesis quota exhausted");
        }
        Ok("media/generated_mock.png".to_string())
    }
}

/// Fetcher that serves placeholder bytes, failing for listed references.
#[derive(Default)]
pub struct MockFetcher {
    pub unfetchable: Vec<String>,
}

#[async_trait]
impl ImageFetcher for MockFetcher {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        if self.unfetchable.iter().any(|r| r == reference) {
            anyhow::bail!("404 Not Found");
        }
        Ok(reference.as_bytes().to_vec())
    }
}

#[derive(Default)]
pub struct MockVideo {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl VideoRenderer for MockVideo {
    async fn render(
        &self,
        _image: Option<&str>,
        _prompt: &str,
        _aspect_ratio: &str,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("render operation failed");
        }
        Ok("media/render_mock.mp4".to_string())
    }
}

/// All the mock handles a test may want to inspect after a run.
pub struct MockSet {
    pub scraper: Arc<MockScraper>,
    pub copy: Arc<MockCopy>,
    pub insights: Arc<MockInsights>,
    pub images: Arc<MockImages>,
    pub fetcher: Arc<MockFetcher>,
    pub video: Arc<MockVideo>,
}

impl MockSet {
    pub fn services(&self) -> Services {
        Services {
            scraper: self.scraper.clone(),
            copy: self.copy.clone(),
            insights: self.insights.clone(),
            images: self.images.clone(),
            fetcher: self.fetcher.clone(),
            video: self.video.clone(),
        }
    }
}

/// Three fetchable candidates and well-behaved collaborators.
pub fn happy_mocks() -> MockSet {
    MockSet {
        scraper: Arc::new(MockScraper {
            images: vec![
                "https://shop.example.com/img/0.jpg".to_string(),
                "https://shop.example.com/img/1.jpg".to_string(),
                "https://shop.example.com/img/2.jpg".to_string(),
            ],
            raw_text: "Wireless earbuds, 30h battery...".to_string(),
            ..Default::default()
        }),
        copy: Arc::new(MockCopy::default()),
        insights: Arc::new(MockInsights::default()),
        images: Arc::new(MockImages {
            rank: RankBehavior::Pick(1),
            ..Default::default()
        }),
        fetcher: Arc::new(MockFetcher::default()),
        video: Arc::new(MockVideo::default()),
    }
}
