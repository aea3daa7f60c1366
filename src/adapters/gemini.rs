//! Generative text/vision/image backend client.
//!
//! One client covers the three capabilities the pipeline takes from this
//! backend: text generation (distillation, research prompts, scripts),
//! multimodal image judgment (ranking, clarity validation), and image
//! synthesis. Responses are normalized here so the core never sees the
//! provider's nesting.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::config::GeminiSettings;
use crate::core::error::CampaignError;
use crate::domain::{FetchedCandidate, InsightDigest, ProductSummary, RankOutcome};

use super::{CopyEngine, ImageEngine};

/// Client for a Gemini-style `generateContent`/`predict` HTTP API.
pub struct GeminiClient {
    settings: GeminiSettings,
    media_dir: PathBuf,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl RequestPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn image(bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: "image/jpeg".to_string(),
                data: BASE64.encode(bytes),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct PredictParameters {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64: Option<String>,
}

/// The distillation answer the text model is asked to produce.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DistilledAnswer {
    product_name: String,
    description: String,
    category: String,
}

/// The ranking answer the vision model is asked to produce.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankAnswer {
    best_image_index: i64,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    generation_prompt: Option<String>,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings, media_dir: &Path) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client for text backend")?;

        Ok(Self {
            settings,
            media_dir: media_dir.to_path_buf(),
            client,
        })
    }

    /// Build the generateContent URL for a model
    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.settings.base_url, model, self.settings.api_key
        )
    }

    /// Build the predict URL for the image model
    fn predict_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:predict?key={}",
            self.settings.base_url, self.settings.image_model, self.settings.api_key
        )
    }

    /// Send one request and return the first text part of the answer.
    async fn generate(&self, model: &str, parts: Vec<RequestPart>) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts,
            }],
        };

        let response = self
            .client
            .post(self.generate_url(model))
            .json(&request)
            .send()
            .await
            .context("Text backend request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Text backend returned {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            );
        }

        let decoded: GenerateResponse = response
            .json()
            .await
            .context("Failed to decode text backend response")?;

        first_text(&decoded).ok_or_else(|| {
            CampaignError::Decode {
                what: "text generation",
                reason: "no text part in any candidate".to_string(),
            }
            .into()
        })
    }

    async fn generate_text(&self, prompt: String) -> Result<String> {
        self.generate(&self.settings.text_model, vec![RequestPart::text(prompt)])
            .await
    }
}

/// First text part across the response candidates.
fn first_text(response: &GenerateResponse) -> Option<String> {
    response
        .candidates
        .iter()
        .flat_map(|c| c.content.parts.iter())
        .find_map(|p| p.text.clone())
}

/// Strip markdown code fences the model wraps JSON answers in.
fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn parse_distilled(text: &str) -> Result<ProductSummary, CampaignError> {
    let answer: DistilledAnswer =
        serde_json::from_str(&strip_fences(text)).map_err(|e| CampaignError::Decode {
            what: "distillation",
            reason: e.to_string(),
        })?;

    Ok(ProductSummary {
        product_name: answer.product_name,
        description: answer.description,
        category: answer.category,
    })
}

fn parse_rank(text: &str, candidate_count: usize) -> Result<RankOutcome, CampaignError> {
    let answer: RankAnswer =
        serde_json::from_str(&strip_fences(text)).map_err(|e| CampaignError::Decode {
            what: "ranking",
            reason: e.to_string(),
        })?;

    let best_index = usize::try_from(answer.best_image_index)
        .ok()
        .filter(|i| *i < candidate_count);

    Ok(RankOutcome {
        best_index,
        reason: answer.reason,
        synthesis_prompt: answer.generation_prompt,
    })
}

fn distill_prompt(raw_text: &str) -> String {
    let excerpt: String = raw_text.chars().take(5000).collect();
    format!(
        "I have raw text scraped from a product page. \
         Your task is to extract the core product information and ignore all noise \
         (reviews, shipping info, footer links, protection plans, etc.).\n\n\
         Raw Scraped Text:\n{excerpt}\n\n\
         Return a JSON object with:\n\
         {{\n\
             \"productName\": \"string\",\n\
             \"description\": \"string (a concise, compelling 2-3 sentence description of the core product features)\",\n\
             \"category\": \"string (a specific, professional category like 'Smart Home Security' or 'Premium Audio')\"\n\
         }}\n\n\
         IMPORTANT: If the text mentions protection plans or warranties, ignore them. \
         Focus ONLY on the physical product being sold.\n\
         Return ONLY the JSON."
    )
}

fn research_prompt_prompt(product: &ProductSummary) -> String {
    format!(
        "I have a product with the following details:\n\
         Category: {}\n\
         Description: {}\n\n\
         Write a specific prompt that I can send to a \"Video Marketing AI\" to find viral videos. \
         The prompt should be in the format: \"Find me the most viral or popular video in the \
         product category [Category] related to [Key Feature], and write a viral script for the product\"\n\
         Return ONLY the prompt string, nothing else.",
        product.category, product.description
    )
}

fn script_prompt(insights: &InsightDigest, product: &ProductSummary) -> String {
    format!(
        "I am creating a 15-second viral short-form video for a product.\n\n\
         Product Description: {}\n\n\
         Here are some insights from a marketing AI about viral trends in this space:\n{}\n\n\
         Using these insights, write a 15-second video script.\n\
         Format:\n\
         [Scene 1]: Visual description (Audio: \"Spoken text\")\n\
         [Scene 2]: ...\n\n\
         Keep it punchy, energetic, and optimized for short-form video.",
        product.description, insights.content
    )
}

fn rank_prompt(candidate_count: usize, description: &str) -> String {
    format!(
        "I have provided {candidate_count} images from a product page.\n\
         Product Description: {description}\n\n\
         Task: Select the SINGLE best image that is a CLEAR, PROFESSIONAL PRODUCT PHOTO.\n\n\
         STRICT DISQUALIFICATION CRITERIA (Return -1 if any of these apply to all images):\n\
         1. NO LIFESTYLE SHOTS: No people, no hands, no busy backgrounds.\n\
         2. NO CAROUSELS/COLLAGES: No images showing multiple photos or a \"reel\" of images.\n\
         3. NO EXPLODED VIEWS: No internal parts or disassembled components.\n\
         4. NO LOGOS/ICONS: No store logos, no UI buttons, no shipping icons.\n\
         5. NO SCHEMATICS: No technical drawings or blueprints.\n\n\
         IDEAL IMAGE:\n\
         - The product is the center of attention.\n\
         - Clean, solid, or transparent background.\n\
         - The product is fully assembled and looks exactly like what the customer receives.\n\n\
         If NONE of the images are a perfect, clean product shot, you MUST return bestImageIndex: -1.\n\n\
         Return a JSON object with:\n\
         {{\n\
             \"bestImageIndex\": number,\n\
             \"reason\": \"string\",\n\
             \"generationPrompt\": \"string (a highly detailed prompt to generate a clean, professional product shot of this specific item on a studio-lit white background)\"\n\
         }}\n\
         Return ONLY the JSON."
    )
}

fn clarity_prompt(description: &str) -> String {
    format!(
        "I am showing you an image selected from a product page.\n\
         Product: {description}\n\n\
         Is this a CLEAR, SINGLE PRODUCT SHOT?\n\n\
         Answer NO if:\n\
         - It is a lifestyle shot (people, hands, busy background).\n\
         - It is a carousel, collage, or shows multiple small photos.\n\
         - It is an exploded view or disassembled parts.\n\
         - It is a logo, icon, or schematic.\n\
         - It is blurry or low quality.\n\n\
         Answer YES only if it is a professional, clean shot of the fully assembled product.\n\n\
         Return ONLY \"YES\" or \"NO\"."
    )
}

#[async_trait]
impl CopyEngine for GeminiClient {
    async fn distill_product(&self, raw_text: &str) -> ProductSummary {
        let answer = match self.generate_text(distill_prompt(raw_text)).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "distillation call failed, using degraded summary");
                return ProductSummary::degraded(raw_text);
            }
        };

        match parse_distilled(&answer) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "distillation answer unparseable, using degraded summary");
                ProductSummary::degraded(raw_text)
            }
        }
    }

    async fn research_prompt(&self, product: &ProductSummary) -> Result<String> {
        let answer = self.generate_text(research_prompt_prompt(product)).await?;
        Ok(answer.trim().to_string())
    }

    async fn write_script(
        &self,
        insights: &InsightDigest,
        product: &ProductSummary,
    ) -> Result<String> {
        let answer = self.generate_text(script_prompt(insights, product)).await?;
        Ok(answer.trim().to_string())
    }
}

#[async_trait]
impl ImageEngine for GeminiClient {
    async fn rank_candidates(
        &self,
        candidates: &[FetchedCandidate],
        description: &str,
    ) -> Result<RankOutcome> {
        let mut parts: Vec<RequestPart> = candidates
            .iter()
            .map(|c| RequestPart::image(&c.bytes))
            .collect();
        parts.push(RequestPart::text(rank_prompt(candidates.len(), description)));

        let answer = self.generate(&self.settings.text_model, parts).await?;
        Ok(parse_rank(&answer, candidates.len())?)
    }

    async fn validate_clarity(
        &self,
        candidate: &FetchedCandidate,
        description: &str,
    ) -> Result<bool> {
        let parts = vec![
            RequestPart::image(&candidate.bytes),
            RequestPart::text(clarity_prompt(description)),
        ];

        let answer = self.generate(&self.settings.text_model, parts).await?;
        Ok(answer.trim().to_uppercase().contains("YES"))
    }

    async fn synthesize(&self, prompt: &str) -> Result<String> {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters { sample_count: 1 },
        };

        let response = self
            .client
            .post(self.predict_url())
            .json(&request)
            .send()
            .await
            .context("Image synthesis request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Image synthesis returned {}", status);
        }

        let decoded: PredictResponse = response
            .json()
            .await
            .context("Failed to decode image synthesis response")?;

        let encoded = decoded
            .predictions
            .first()
            .and_then(|p| p.bytes_base64.as_ref())
            .ok_or(CampaignError::Decode {
                what: "image synthesis",
                reason: "no image bytes in prediction".to_string(),
            })?;

        let bytes = BASE64
            .decode(encoded)
            .context("Synthesized image is not valid base64")?;

        tokio::fs::create_dir_all(&self.media_dir)
            .await
            .with_context(|| {
                format!("Failed to create media dir: {}", self.media_dir.display())
            })?;

        let file_name = format!("generated_{}.png", &Uuid::new_v4().to_string()[..8]);
        let path = self.media_dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write synthesized image: {}", path.display()))?;

        Ok(path.to_string_lossy().into_owned())
    }
}
