//! Product data flowing through the pipeline stages.
//!
//! Raw scraped material is distilled into a [`ProductSummary`], and the
//! scraped image references become a bounded [`CandidateSet`] for
//! selection.

use serde::{Deserialize, Serialize};

/// Maximum number of scraped image references considered for selection.
pub const CANDIDATE_CAP: usize = 15;

/// Raw output of the page scraper collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPage {
    /// Image references in page order
    pub images: Vec<String>,

    /// All substantial text found on the page
    pub raw_text: String,

    /// Page-level category hint, if the page exposed one
    pub category: Option<String>,
}

/// Distilled core product data, produced once per campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_name: String,
    pub description: String,
    pub category: String,
}

impl ProductSummary {
    /// Degraded-but-valid summary used when distillation cannot parse
    /// the backend's answer. All three fields are always populated.
    pub fn degraded(raw_text: &str) -> Self {
        let description: String = raw_text.chars().take(200).collect();
        Self {
            product_name: "Unknown Product".to_string(),
            description,
            category: "General".to_string(),
        }
    }
}

/// Ordered, deduplicated, capped set of image references considered for
/// selection. Read-only once captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSet {
    references: Vec<String>,
}

impl CandidateSet {
    /// Capture a candidate set from scraped references: preserve first-seen
    /// order, drop duplicates, cap to `CANDIDATE_CAP`.
    pub fn capture(scraped: &[String]) -> Self {
        Self::capture_with_cap(scraped, CANDIDATE_CAP)
    }

    /// `capture` with an explicit cap.
    pub fn capture_with_cap(scraped: &[String], cap: usize) -> Self {
        let mut references = Vec::new();
        for reference in scraped {
            if references.len() >= cap {
                break;
            }
            if !reference.is_empty() && !references.contains(reference) {
                references.push(reference.clone());
            }
        }
        Self { references }
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// An image candidate whose binary content was successfully fetched.
#[derive(Debug, Clone)]
pub struct FetchedCandidate {
    /// The original reference (URL or path) this was fetched from
    pub reference: String,

    /// Raw image bytes
    pub bytes: Vec<u8>,
}

/// Normalized marketing-insights digest from the trend research backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightDigest {
    /// Free-text analysis of viral patterns in the product's space
    pub content: String,

    /// Names of the reference videos the analysis leaned on, best first
    pub ranked_references: Vec<String>,

    /// Public URLs for the top reference videos
    pub external_video_urls: Vec<String>,
}

/// Verdict of the ranking capability over a fetched candidate set.
#[derive(Debug, Clone)]
pub struct RankOutcome {
    /// Zero-based index of the single best candidate, or `None` if the
    /// disqualification policy rejected every candidate
    pub best_index: Option<usize>,

    /// The ranker's reasoning, logged with the selection
    pub reason: String,

    /// Prompt to synthesize a replacement image if nothing qualifies
    pub synthesis_prompt: Option<String>,
}

/// Final outcome of image selection: exactly one reference, always.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reference", rename_all = "snake_case")]
pub enum Selection {
    /// One of the scraped candidates survived ranking and validation
    Selected(String),

    /// No candidate qualified; a new image was synthesized
    Generated(String),
}

impl Selection {
    /// The image reference, regardless of how it was obtained
    pub fn reference(&self) -> &str {
        match self {
            Selection::Selected(r) | Selection::Generated(r) => r,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Selection::Generated(_))
    }
}

/// A selection together with the reasoning that produced it.
#[derive(Debug, Clone)]
pub struct SelectionReport {
    pub selection: Selection,
    pub reason: String,
}
