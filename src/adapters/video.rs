//! Long-running video generation client.
//!
//! The backend exposes generation as an operation: one call starts it,
//! then the operation is polled until `done`. From the pipeline's
//! perspective this whole dance is a single blocking call that resolves
//! to a video reference; renders routinely take tens of seconds to
//! minutes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::VideoSettings;
use crate::core::error::CampaignError;

use super::VideoRenderer;

/// Client for a Veo-style long-running video generation API.
pub struct VeoClient {
    settings: VideoSettings,
    media_dir: PathBuf,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GeneratedVideos>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedVideos {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    uri: Option<String>,
}

impl VeoClient {
    pub fn new(settings: VideoSettings, media_dir: &Path) -> Result<Self> {
        // No request timeout here: the start call is fast but the
        // download of a finished render can be large.
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client for video backend")?;

        Ok(Self {
            settings,
            media_dir: media_dir.to_path_buf(),
            client,
        })
    }

    fn start_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:predictLongRunning?key={}",
            self.settings.base_url, self.settings.model, self.settings.api_key
        )
    }

    fn operation_url(&self, name: &str) -> String {
        format!(
            "{}/v1beta/{}?key={}",
            self.settings.base_url, name, self.settings.api_key
        )
    }

    /// Poll the operation until it reports `done`.
    async fn wait_for_operation(&self, name: &str) -> Result<Operation> {
        loop {
            let operation: Operation = self
                .client
                .get(self.operation_url(name))
                .send()
                .await
                .context("Operation poll failed")?
                .error_for_status()
                .context("Operation poll rejected")?
                .json()
                .await
                .context("Failed to decode operation status")?;

            if operation.done {
                return Ok(operation);
            }

            debug!(operation = name, "waiting for video generation to complete");
            tokio::time::sleep(std::time::Duration::from_secs(
                self.settings.poll_interval_secs,
            ))
            .await;
        }
    }

    /// Download the finished render into the media directory.
    async fn download(&self, uri: &str) -> Result<String> {
        let response = self
            .client
            .get(uri)
            .query(&[("key", self.settings.api_key.as_str())])
            .send()
            .await
            .context("Video download failed")?
            .error_for_status()
            .context("Video download rejected")?;

        let bytes = response
            .bytes()
            .await
            .context("Failed to read video bytes")?;

        tokio::fs::create_dir_all(&self.media_dir)
            .await
            .with_context(|| {
                format!("Failed to create media dir: {}", self.media_dir.display())
            })?;

        let file_name = format!("render_{}.mp4", &Uuid::new_v4().to_string()[..8]);
        let path = self.media_dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write video: {}", path.display()))?;

        Ok(path.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl VideoRenderer for VeoClient {
    async fn render(
        &self,
        image: Option<&str>,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<String> {
        let mut instance = serde_json::json!({ "prompt": prompt });
        if let Some(image) = image {
            instance["image"] = serde_json::json!({ "reference": image });
        }

        let request = serde_json::json!({
            "instances": [instance],
            "parameters": { "aspectRatio": aspect_ratio },
        });

        let handle: OperationHandle = self
            .client
            .post(self.start_url())
            .json(&request)
            .send()
            .await
            .context("Video generation request failed")?
            .error_for_status()
            .context("Video generation rejected")?
            .json()
            .await
            .context("Failed to decode video operation handle")?;

        info!(operation = %handle.name, "video generation started");
        let operation = self.wait_for_operation(&handle.name).await?;

        if let Some(error) = operation.error {
            anyhow::bail!(
                "Video generation failed: {}",
                error.message.unwrap_or_else(|| "unknown error".to_string())
            );
        }

        let uri = operation
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|g| g.generated_samples.into_iter().next())
            .and_then(|s| s.video)
            .and_then(|v| v.uri)
            .ok_or(CampaignError::Decode {
                what: "video generation",
                reason: "no video file in finished operation".to_string(),
            })?;

        self.download(&uri).await
    }
}
