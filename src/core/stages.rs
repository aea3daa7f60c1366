//! Stage execution for a campaign run.
//!
//! Five stages run strictly in order, each consuming the previous
//! stage's output: Intel (scrape + distill), Trend (research prompt +
//! insights), Script, Image Selection, Render. The first uncaught stage
//! error short-circuits the sequence; no later stage executes and the
//! log accumulated so far is retained by the caller.

use rand::Rng;
use regex::Regex;
use serde_json::json;
use tracing::info;

use crate::adapters::Services;
use crate::core::error::CampaignError;
use crate::core::log::CampaignLog;
use crate::core::selector::ImageSelector;
use crate::domain::{
    CandidateSet, InsightDigest, LogTag, ProductSummary, RenderOutcome, ResultBundle, ScrapedPage,
    Selection, SelectionReport,
};

/// Aspect ratio for short-form vertical video.
const ASPECT_RATIO: &str = "9:16";

/// Insights platform the trend research is keyed to.
const INSIGHTS_PLATFORM: &str = "TIKTOK";

/// Longest script excerpt folded into the video prompt.
const SCRIPT_EXCERPT_CHARS: usize = 500;

/// Runs the five pipeline stages for one campaign.
pub struct StageExecutor<'a> {
    services: &'a Services,
    log: &'a mut CampaignLog,
    skip_render: bool,
}

impl<'a> StageExecutor<'a> {
    pub fn new(services: &'a Services, log: &'a mut CampaignLog, skip_render: bool) -> Self {
        Self {
            services,
            log,
            skip_render,
        }
    }

    /// Execute all stages in order, short-circuiting on the first error.
    pub async fn execute(&mut self, url: &str) -> Result<ResultBundle, CampaignError> {
        let (page, product) = self.intel(url).await?;
        let (research_prompt, insights) = self.trend(&product).await?;
        let script = self.script(&insights, &product).await?;

        let candidates = CandidateSet::capture(&page.images);
        let report = self.select_image(&candidates, &product).await?;

        let (video_prompt, render) = self.render(&report.selection, &product, &script).await?;

        Ok(ResultBundle {
            product,
            research_prompt,
            insights,
            script,
            selected_image: report.selection,
            video_prompt,
            render,
        })
    }

    /// Intel: scrape the page, then distill the raw text into a product
    /// summary. Distillation never fails; a decode problem degrades to a
    /// truncated-text summary.
    async fn intel(&mut self, url: &str) -> Result<(ScrapedPage, ProductSummary), CampaignError> {
        self.log
            .record(LogTag::Intel, format!("Scraping URL: {}", url));

        let page = self
            .services
            .scraper
            .scrape(url)
            .await
            .map_err(|e| CampaignError::collaborator("intel", e))?;

        self.log.record(
            LogTag::Intel,
            "Distilling core product data from raw text...",
        );
        let product = self.services.copy.distill_product(&page.raw_text).await;

        self.log.record(
            LogTag::Intel,
            format!("Product identified: {}", product.product_name),
        );
        self.log.record_with(
            LogTag::Intel,
            "Data extraction complete.",
            json!({
                "category": product.category,
                "description": product.description,
            }),
        );

        Ok((page, product))
    }

    /// Trend: derive the research prompt, then fetch the insight digest
    /// under a fresh random session id so upstream caching never
    /// collides between runs.
    async fn trend(
        &mut self,
        product: &ProductSummary,
    ) -> Result<(String, InsightDigest), CampaignError> {
        self.log
            .record(LogTag::Trend, "Generating research prompt...");

        let research_prompt = self
            .services
            .copy
            .research_prompt(product)
            .await
            .map_err(|e| CampaignError::collaborator("trend", e))?;

        self.log.record_with(
            LogTag::Trend,
            "Viral research prompt synthesized.",
            json!({ "prompt": research_prompt }),
        );

        let session_id = rand::rng().random_range(0..1_000_000);
        self.log.record(
            LogTag::Trend,
            format!("Fetching marketing insights (session {})...", session_id),
        );

        let insights = self
            .services
            .insights
            .fetch_insights(&research_prompt, session_id, INSIGHTS_PLATFORM)
            .await
            .map_err(|e| CampaignError::collaborator("trend", e))?;

        self.log.record_with(
            LogTag::Trend,
            "Marketing insights received.",
            json!({
                "insights": insights
                    .ranked_references
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "Viral trend identified.".to_string()),
                "rawOutput": insights.content,
            }),
        );

        Ok((research_prompt, insights))
    }

    /// Script: turn the digest and summary into a scene-delimited script.
    async fn script(
        &mut self,
        insights: &InsightDigest,
        product: &ProductSummary,
    ) -> Result<String, CampaignError> {
        self.log.record(LogTag::Script, "Writing video script...");

        let script = self
            .services
            .copy
            .write_script(insights, product)
            .await
            .map_err(|e| CampaignError::collaborator("script", e))?;

        let hook = script.lines().next().unwrap_or_default().to_string();
        self.log.record_with(
            LogTag::Script,
            "Viral script finalized.",
            json!({ "script": script, "hook": hook }),
        );

        Ok(script)
    }

    /// Image selection: run the selector's fallback chain, logging the
    /// outcome and its reasoning for the envelope consumers.
    async fn select_image(
        &mut self,
        candidates: &CandidateSet,
        product: &ProductSummary,
    ) -> Result<SelectionReport, CampaignError> {
        self.log.record(
            LogTag::Render,
            format!(
                "Selecting best product image ({} candidates)...",
                candidates.len()
            ),
        );

        let selector = ImageSelector::new(
            self.services.images.as_ref(),
            self.services.fetcher.as_ref(),
        );
        let report = selector.select(candidates, &product.description).await?;

        let outcome = if report.selection.is_generated() {
            "generated"
        } else {
            "selected"
        };
        self.log.record_with(
            LogTag::Render,
            "Image selection complete.",
            json!({
                "outcome": outcome,
                "image": report.selection.reference(),
                "reason": report.reason,
            }),
        );

        Ok(report)
    }

    /// Render: always construct the video prompt; invoke the renderer
    /// unless rendering is explicitly skipped, in which case the
    /// would-be inputs are packaged for inspection.
    async fn render(
        &mut self,
        selection: &Selection,
        product: &ProductSummary,
        script: &str,
    ) -> Result<(String, RenderOutcome), CampaignError> {
        let video_prompt = build_video_prompt(product, script);
        self.log.record_with(
            LogTag::Render,
            "Cinematic video prompt generated.",
            json!({ "videoPrompt": video_prompt }),
        );

        if self.skip_render {
            self.log.record(
                LogTag::System,
                "Video generation skipped (inputs prepared above).",
            );
            return Ok((
                video_prompt.clone(),
                RenderOutcome::Skipped {
                    video_prompt,
                    image: selection.reference().to_string(),
                },
            ));
        }

        self.log.record(LogTag::Render, "Generating video...");
        let video = self
            .services
            .video
            .render(Some(selection.reference()), &video_prompt, ASPECT_RATIO)
            .await
            .map_err(|e| CampaignError::collaborator("render", e))?;

        info!(video = %video, "video render complete");
        self.log
            .record(LogTag::Render, "Video generated successfully.");

        Ok((video_prompt, RenderOutcome::Completed { video }))
    }
}

/// Build the video-generation prompt from category, description, and a
/// truncated script excerpt with bracketed scene directions removed.
fn build_video_prompt(product: &ProductSummary, script: &str) -> String {
    let flow = script_excerpt(script, SCRIPT_EXCERPT_CHARS);
    format!(
        "Create a high-energy, viral {} advertisement for this product: {}. \
         Product Description: {}. \
         Follow this script flow: {}. \
         Visual Style: Cinematic, high-fidelity, vibrant lighting, professional product showcase.",
        ASPECT_RATIO, product.category, product.description, flow
    )
}

fn script_excerpt(script: &str, max_chars: usize) -> String {
    let markers = Regex::new(r"\[.*?\]").unwrap();
    let stripped = markers.replace_all(script, "");
    stripped.trim().chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_excerpt_strips_scene_markers() {
        let script = "[Scene 1]: Close-up (Audio: \"Wow\")\n[Scene 2]: Wide shot";
        let excerpt = script_excerpt(script, 500);
        assert!(!excerpt.contains('['));
        assert!(excerpt.contains("Close-up"));
    }

    #[test]
    fn test_script_excerpt_truncates() {
        let script = "a".repeat(2000);
        assert_eq!(script_excerpt(&script, 500).len(), 500);
    }

    #[test]
    fn test_video_prompt_carries_category_and_description() {
        let product = ProductSummary {
            product_name: "Acme Buds".to_string(),
            description: "Wireless earbuds".to_string(),
            category: "Audio".to_string(),
        };
        let prompt = build_video_prompt(&product, "[Scene 1]: hook");
        assert!(prompt.contains("Audio"));
        assert!(prompt.contains("Wireless earbuds"));
        assert!(prompt.contains("9:16"));
    }
}
