//! Campaign log entries.
//!
//! Every milestone of a campaign run is recorded as an immutable,
//! timestamped entry in an append-only log. The same entries are pushed
//! to a live subscriber while the run is in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in a campaign's append-only log.
///
/// Entries are insertion-ordered and never mutated or removed. The
/// optional payload carries stage-specific structured data (the research
/// prompt, the finalized script, the selection reasoning).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// When this entry was recorded
    pub timestamp: DateTime<Utc>,

    /// Which part of the pipeline produced it
    pub tag: LogTag,

    /// Human-readable summary (NO secrets)
    pub message: String,

    /// Structured stage-specific data, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new entry with the current timestamp
    pub fn new(tag: LogTag, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            tag,
            message: message.into(),
            payload: None,
        }
    }

    /// Attach a structured payload
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Fixed tag vocabulary for campaign log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogTag {
    /// Scraping and product distillation
    Intel,

    /// Trend research and marketing insights
    Trend,

    /// Script writing
    Script,

    /// Image selection, prompt construction, video generation
    Render,

    /// Orchestrator housekeeping (start, skip notices, completion)
    System,

    /// A failure that terminated the campaign
    Error,
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogTag::Intel => "INTEL",
            LogTag::Trend => "TREND",
            LogTag::Script => "SCRIPT",
            LogTag::Render => "RENDER",
            LogTag::System => "SYSTEM",
            LogTag::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}
