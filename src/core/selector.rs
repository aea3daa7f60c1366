//! Image candidate selection.
//!
//! Resolves one usable product image from noisy scraped input, or
//! synthesizes one. Two independent AI judgments (rank, then a clarity
//! validation of the single winner) gate a scraped candidate; every
//! disqualification falls through to synthesis, so the pipeline never
//! stalls for lack of an image. Only a failure of synthesis itself is
//! fatal.

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::adapters::{ImageEngine, ImageFetcher};
use crate::core::error::CampaignError;
use crate::domain::{CandidateSet, FetchedCandidate, RankOutcome, Selection, SelectionReport};

/// Upper bound on concurrent candidate downloads.
const FETCH_CONCURRENCY: usize = 4;

/// Narrows a candidate set to exactly one image reference.
pub struct ImageSelector<'a> {
    images: &'a dyn ImageEngine,
    fetcher: &'a dyn ImageFetcher,
}

impl<'a> ImageSelector<'a> {
    pub fn new(images: &'a dyn ImageEngine, fetcher: &'a dyn ImageFetcher) -> Self {
        Self { images, fetcher }
    }

    /// Run the full selection sequence for a candidate set.
    ///
    /// Never returns more than one reference and never returns none; the
    /// only error is [`CampaignError::SynthesisExhausted`].
    pub async fn select(
        &self,
        candidates: &CandidateSet,
        description: &str,
    ) -> Result<SelectionReport, CampaignError> {
        let fetched = self.fetch_candidates(candidates).await;

        if fetched.is_empty() {
            debug!("no fetchable candidates, synthesizing from description");
            let reference = self
                .synthesize(&generic_synthesis_prompt(description))
                .await?;
            return Ok(SelectionReport {
                selection: Selection::Generated(reference),
                reason: "No fetchable candidate images on the page.".to_string(),
            });
        }

        let outcome = match self.images.rank_candidates(&fetched, description).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // Ranking unavailable: fall back to the first fetchable
                // candidate unranked rather than aborting the campaign.
                warn!(error = %e, "candidate ranking failed, taking first fetchable candidate");
                return Ok(SelectionReport {
                    selection: Selection::Selected(fetched[0].reference.clone()),
                    reason: "Ranking unavailable; first fetchable candidate used unranked."
                        .to_string(),
                });
            }
        };

        if let Some(best) = self.validated_winner(&fetched, &outcome, description).await {
            return Ok(SelectionReport {
                selection: Selection::Selected(best),
                reason: outcome.reason,
            });
        }

        let prompt = outcome
            .synthesis_prompt
            .unwrap_or_else(|| generic_synthesis_prompt(description));
        let reference = self.synthesize(&prompt).await?;
        Ok(SelectionReport {
            selection: Selection::Generated(reference),
            reason: outcome.reason,
        })
    }

    /// Fetch binary content for the candidate set, preserving original
    /// order and dropping unfetchable entries.
    async fn fetch_candidates(&self, candidates: &CandidateSet) -> Vec<FetchedCandidate> {
        stream::iter(candidates.references())
            .map(|reference| async move {
                match self.fetcher.fetch(reference).await {
                    Ok(bytes) => Some(FetchedCandidate {
                        reference: reference.clone(),
                        bytes,
                    }),
                    Err(e) => {
                        debug!(reference = %reference, error = %e, "dropping unfetchable candidate");
                        None
                    }
                }
            })
            .buffered(FETCH_CONCURRENCY)
            .filter_map(|c| async move { c })
            .collect()
            .await
    }

    /// If ranking picked a candidate, run the independent clarity check
    /// on that one candidate only. A failed or erroring validation
    /// disqualifies the pick.
    async fn validated_winner(
        &self,
        fetched: &[FetchedCandidate],
        outcome: &RankOutcome,
        description: &str,
    ) -> Option<String> {
        let index = outcome.best_index?;
        let candidate = fetched.get(index)?;

        match self.images.validate_clarity(candidate, description).await {
            Ok(true) => Some(candidate.reference.clone()),
            Ok(false) => {
                debug!(reference = %candidate.reference, "ranked candidate failed clarity validation");
                None
            }
            Err(e) => {
                warn!(error = %e, "clarity validation failed, disqualifying candidate");
                None
            }
        }
    }

    async fn synthesize(&self, prompt: &str) -> Result<String, CampaignError> {
        self.images
            .synthesize(prompt)
            .await
            .map_err(CampaignError::SynthesisExhausted)
    }
}

/// Prompt used when ranking did not supply a synthesis prompt.
fn generic_synthesis_prompt(description: &str) -> String {
    format!(
        "A clean, professional studio product photo of {} on a studio-lit white background.",
        description
    )
}
