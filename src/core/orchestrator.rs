//! Campaign orchestrator.
//!
//! The public entry point for a run. Owns the campaign envelope,
//! validates input before any collaborator is invoked, delegates to the
//! stage executor, and converts the first stage error into the failed
//! terminal outcome. Callers always receive a well-formed envelope,
//! never an unhandled error.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::adapters::Services;
use crate::config::Config;
use crate::core::error::CampaignError;
use crate::core::log::{CampaignLog, LogSink};
use crate::core::stages::StageExecutor;
use crate::domain::{Campaign, CampaignStatus, LogTag};

/// Main campaign orchestrator.
pub struct Orchestrator {
    services: Services,
}

impl Orchestrator {
    /// Create an orchestrator over an explicit set of collaborators.
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Create an orchestrator with the concrete HTTP adapters from
    /// resolved configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(Services::from_config(config)?))
    }

    /// Run one campaign to its terminal outcome.
    ///
    /// If `sink` is present it receives every log entry as it is
    /// recorded; its absence changes observability, not the result. The
    /// run always completes with exactly one terminal status, and the
    /// returned log covers everything up to that point.
    #[instrument(skip(self, sink), fields(url = %url))]
    pub async fn run(
        &self,
        url: &str,
        skip_render: bool,
        sink: Option<Arc<dyn LogSink>>,
    ) -> Campaign {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut log = CampaignLog::new(sink);

        // Fast local validation, before any collaborator is invoked.
        if let Err(e) = validate_url(url) {
            log.record(LogTag::Error, e.to_string());
            return Campaign {
                id,
                url: url.to_string(),
                status: CampaignStatus::Failed {
                    error: e.to_string(),
                },
                started_at,
                completed_at: Utc::now(),
                log: log.into_entries(),
            };
        }

        info!(%id, "starting campaign");
        log.record(LogTag::System, format!("Campaign started for {}", url));

        let mut executor = StageExecutor::new(&self.services, &mut log, skip_render);
        let status = match executor.execute(url).await {
            Ok(bundle) => {
                log.record(LogTag::System, "Campaign completed.");
                info!(%id, "campaign completed");
                CampaignStatus::Success {
                    result: Box::new(bundle),
                }
            }
            Err(e) => {
                let message = e.to_string();
                error!(%id, error = %message, "campaign failed");
                log.record_with(
                    LogTag::Error,
                    format!("Campaign failed: {}", message),
                    serde_json::json!({ "error": message }),
                );
                CampaignStatus::Failed { error: message }
            }
        };

        Campaign {
            id,
            url: url.to_string(),
            status,
            started_at,
            completed_at: Utc::now(),
            log: log.into_entries(),
        }
    }
}

/// Validate that the input is a syntactically valid absolute http(s) URL.
fn validate_url(url: &str) -> Result<(), CampaignError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| CampaignError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CampaignError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_absolute_http() {
        assert!(validate_url("https://example.com/product").is_ok());
        assert!(validate_url("http://shop.example.com/item?id=3").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_relative_and_other_schemes() {
        assert!(validate_url("not-a-url").is_err());
        assert!(validate_url("/product/3").is_err());
        assert!(validate_url("ftp://example.com/file").is_err());
    }
}
