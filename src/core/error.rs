//! Error taxonomy for campaign execution.
//!
//! Adapters construct the typed variants and bubble them through
//! `anyhow`; the orchestrator converts whatever reaches its boundary
//! into the failed terminal envelope.

use thiserror::Error;

/// Failures a campaign can terminate with.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// The input URL failed local validation; no collaborator was invoked.
    #[error("invalid campaign url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// An external capability call failed. Fatal to the campaign.
    #[error("{stage} stage failed: {source}")]
    Collaborator {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Image synthesis itself failed after all selection fallbacks.
    #[error("image synthesis failed: {0}")]
    SynthesisExhausted(#[source] anyhow::Error),

    /// A collaborator response could not be parsed into the expected
    /// structure. Swallowed by distillation, disqualifying for
    /// ranking/validation, fatal elsewhere.
    #[error("could not decode {what} response: {reason}")]
    Decode { what: &'static str, reason: String },
}

impl CampaignError {
    /// Wrap a collaborator failure with the stage it occurred in.
    pub fn collaborator(stage: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Collaborator {
            stage,
            source: source.into(),
        }
    }
}
