//! Marketing-insights API client.
//!
//! Talks to a marketer-chat backend that analyzes viral videos in a
//! product's space. The provider nests its useful material several
//! levels deep (`data.thinkings[].refs[].video`); this adapter flattens
//! it into the normalized [`InsightDigest`] contract and resolves the
//! top reference videos to public URLs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::config::MarketerSettings;
use crate::domain::InsightDigest;

use super::InsightsSource;

/// Number of reference videos resolved to public URLs per digest.
const MAX_VIDEO_DETAILS: usize = 3;

/// Client for the marketer-chat insights API.
pub struct MarketerClient {
    settings: MarketerSettings,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    data: Option<ChatData>,
}

#[derive(Debug, Deserialize)]
struct ChatData {
    content: Option<String>,
    #[serde(default)]
    thinkings: Vec<Thinking>,
}

#[derive(Debug, Deserialize)]
struct Thinking {
    #[serde(default)]
    refs: Vec<ThinkingRef>,
}

#[derive(Debug, Deserialize)]
struct ThinkingRef {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    video_no: Option<String>,
    video_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    data: Option<DetailData>,
}

#[derive(Debug, Deserialize)]
struct DetailData {
    video_url: Option<String>,
}

impl MarketerClient {
    pub fn new(settings: MarketerSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client for insights backend")?;

        Ok(Self { settings, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/marketer_chat", self.settings.base_url)
    }

    fn detail_url(&self) -> String {
        format!("{}/get_public_video_detail", self.settings.base_url)
    }

    /// Resolve one reference video to its public URL. Failures are the
    /// caller's to swallow; a missing detail never fails the digest.
    async fn video_url(&self, video_no: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.detail_url())
            .header("Authorization", &self.settings.api_key)
            .query(&[("video_no", video_no)])
            .send()
            .await
            .context("Video detail request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Video detail returned {}", response.status());
        }

        let detail: DetailResponse = response
            .json()
            .await
            .context("Failed to decode video detail response")?;

        Ok(detail.data.and_then(|d| d.video_url))
    }
}

/// Flatten the provider's nested response into the normalized digest,
/// without the external URLs (resolved separately).
fn normalize(response: ChatResponse) -> (InsightDigest, Vec<String>) {
    let data = match response.data {
        Some(data) => data,
        None => return (InsightDigest::default(), Vec::new()),
    };

    let mut ranked_references = Vec::new();
    let mut video_nos = Vec::new();

    for thinking in &data.thinkings {
        for reference in &thinking.refs {
            if let Some(video) = &reference.video {
                if let Some(name) = &video.video_name {
                    if !ranked_references.contains(name) {
                        ranked_references.push(name.clone());
                    }
                }
                if let Some(no) = &video.video_no {
                    if !video_nos.contains(no) {
                        video_nos.push(no.clone());
                    }
                }
            }
        }
    }

    video_nos.truncate(MAX_VIDEO_DETAILS);

    let digest = InsightDigest {
        content: data
            .content
            .unwrap_or_else(|| "Analyzing viral patterns and engagement metrics...".to_string()),
        ranked_references,
        external_video_urls: Vec::new(),
    };

    (digest, video_nos)
}

#[async_trait]
impl InsightsSource for MarketerClient {
    async fn fetch_insights(
        &self,
        prompt: &str,
        session_id: u32,
        platform: &str,
    ) -> Result<InsightDigest> {
        let response = self
            .client
            .post(self.chat_url())
            .header("Authorization", &self.settings.api_key)
            .json(&serde_json::json!({
                "prompt": prompt,
                "session_id": session_id,
                "type": platform,
            }))
            .send()
            .await
            .context("Insights request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Insights backend returned {}", response.status());
        }

        let decoded: ChatResponse = response
            .json()
            .await
            .context("Failed to decode insights response")?;

        let (mut digest, video_nos) = normalize(decoded);

        for video_no in &video_nos {
            match self.video_url(video_no).await {
                Ok(Some(url)) => digest.external_video_urls.push(url),
                Ok(None) => {}
                Err(e) => {
                    warn!(video_no = %video_no, error = %e, "skipping unresolvable reference video");
                }
            }
        }

        Ok(digest)
    }
}
