//! Campaign state and the terminal result envelope.
//!
//! A Campaign represents one end-to-end run for a single input URL. It is
//! created at invocation, mutated only by the orchestrator, and immutable
//! once its terminal status is set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::log_entry::LogEntry;
use super::product::{InsightDigest, ProductSummary, Selection};

/// One end-to-end orchestrated run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Unique identifier for this run
    pub id: Uuid,

    /// The input product-page URL
    pub url: String,

    /// Terminal status and, on success, the result bundle
    #[serde(flatten)]
    pub status: CampaignStatus,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the terminal status was set
    pub completed_at: DateTime<Utc>,

    /// The complete ordered log, up to the terminal outcome
    pub log: Vec<LogEntry>,
}

impl Campaign {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, CampaignStatus::Success { .. })
    }

    /// The result bundle, if the campaign succeeded
    pub fn result(&self) -> Option<&ResultBundle> {
        match &self.status {
            CampaignStatus::Success { result } => Some(result),
            CampaignStatus::Failed { .. } => None,
        }
    }

    /// The failure message, if the campaign failed
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            CampaignStatus::Success { .. } => None,
            CampaignStatus::Failed { error } => Some(error),
        }
    }
}

/// Exactly one terminal outcome per campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CampaignStatus {
    /// The full pipeline completed
    Success { result: Box<ResultBundle> },

    /// A stage failed; the log explains how far execution progressed
    Failed { error: String },
}

/// The immutable success payload. Safe to serialize and share
/// independently of the run that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultBundle {
    /// Distilled product data
    pub product: ProductSummary,

    /// The prompt sent to the trend research backend
    pub research_prompt: String,

    /// Normalized marketing insights
    pub insights: InsightDigest,

    /// The finalized scene-delimited script
    pub script: String,

    /// The one image the selector settled on
    pub selected_image: Selection,

    /// The constructed video-generation prompt
    pub video_prompt: String,

    /// Render result or skip descriptor
    pub render: RenderOutcome,
}

/// What happened at the render stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// The video collaborator produced a render
    Completed { video: String },

    /// Rendering was explicitly skipped; the would-be inputs are
    /// packaged for inspection
    Skipped { video_prompt: String, image: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::log_entry::{LogEntry, LogTag};

    fn sample_bundle() -> ResultBundle {
        ResultBundle {
            product: ProductSummary {
                product_name: "Acme Buds".to_string(),
                description: "Wireless earbuds, 30h battery".to_string(),
                category: "Audio".to_string(),
            },
            research_prompt: "Find viral audio-product videos".to_string(),
            insights: InsightDigest::default(),
            script: "[Scene 1]: Close-up".to_string(),
            selected_image: Selection::Selected("https://a/1.jpg".to_string()),
            video_prompt: "High-energy 9:16 advertisement".to_string(),
            render: RenderOutcome::Completed {
                video: "media/out.mp4".to_string(),
            },
        }
    }

    #[test]
    fn test_success_envelope_serialization() {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            url: "https://example.com/product".to_string(),
            status: CampaignStatus::Success {
                result: Box::new(sample_bundle()),
            },
            started_at: now,
            completed_at: now,
            log: vec![LogEntry::new(LogTag::System, "Campaign started")],
        };

        let json = serde_json::to_value(&campaign).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["result"]["product"]["product_name"], "Acme Buds");
        assert!(campaign.succeeded());
        assert!(campaign.error().is_none());
    }

    #[test]
    fn test_failed_envelope_serialization() {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            url: "not-a-url".to_string(),
            status: CampaignStatus::Failed {
                error: "invalid campaign url".to_string(),
            },
            started_at: now,
            completed_at: now,
            log: Vec::new(),
        };

        let json = serde_json::to_value(&campaign).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "invalid campaign url");
        assert!(campaign.result().is_none());
    }

    #[test]
    fn test_skipped_render_round_trip() {
        let outcome = RenderOutcome::Skipped {
            video_prompt: "prompt".to_string(),
            image: "https://a/1.jpg".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        let parsed: RenderOutcome = serde_json::from_str(&json).unwrap();
        match parsed {
            RenderOutcome::Skipped { video_prompt, image } => {
                assert_eq!(video_prompt, "prompt");
                assert_eq!(image, "https://a/1.jpg");
            }
            RenderOutcome::Completed { .. } => panic!("expected skipped"),
        }
    }
}
