//! Configuration for collaborator backends.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PROMOGEN_*)
//! 2. Config file (.promogen/config.yaml)
//! 3. Defaults
//!
//! Config file discovery searches the current directory and its parents.
//! The resolved [`Config`] is a plain value injected into the adapters
//! at construction; there is no process-wide configuration state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub media_dir: Option<String>,
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub marketer: MarketerSection,
    #[serde(default)]
    pub video: VideoSection,
    #[serde(default)]
    pub scraper: ScraperSection,
    #[serde(default)]
    pub fetch: FetchSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketerSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScraperSection {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchSection {
    pub timeout_secs: Option<u64>,
}

/// Resolved configuration injected into the orchestrator's dependencies.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory synthesized images and rendered videos are written to
    pub media_dir: PathBuf,
    pub gemini: GeminiSettings,
    pub marketer: MarketerSettings,
    pub video: VideoSettings,
    pub scraper: ScraperSettings,
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct MarketerSettings {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct VideoSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout_secs: u64,
}

const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MARKETER_BASE_URL: &str = "https://api.memories.ai/serve/api/v1";
const DEFAULT_SCRAPER_BASE_URL: &str = "http://localhost:8700";

impl Config {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self> {
        let config_file = find_config_file();
        let (file, base_dir) = match &config_file {
            Some(path) => {
                let file = load_config_file(path)?;
                // media paths in the file are relative to the project
                // root (the parent of .promogen/)
                let base = path
                    .parent()
                    .and_then(|p| p.parent())
                    .map(Path::to_path_buf);
                (file, base)
            }
            None => (ConfigFile::default(), None),
        };

        Ok(Self::resolve(&file, base_dir.as_deref()))
    }

    /// Resolve a raw config file against env vars and defaults.
    pub fn resolve(file: &ConfigFile, base_dir: Option<&Path>) -> Self {
        let media_dir = env_var("PROMOGEN_MEDIA_DIR")
            .map(PathBuf::from)
            .or_else(|| {
                file.media_dir
                    .as_ref()
                    .map(|p| resolve_path(base_dir, p))
            })
            .unwrap_or_else(default_media_dir);

        Self {
            media_dir,
            gemini: GeminiSettings {
                api_key: env_var("PROMOGEN_GEMINI_API_KEY")
                    .or_else(|| file.gemini.api_key.clone())
                    .unwrap_or_default(),
                base_url: env_var("PROMOGEN_GEMINI_URL")
                    .or_else(|| file.gemini.base_url.clone())
                    .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
                text_model: file
                    .gemini
                    .text_model
                    .clone()
                    .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
                image_model: file
                    .gemini
                    .image_model
                    .clone()
                    .unwrap_or_else(|| "imagen-4.0-generate-001".to_string()),
                timeout_secs: file.gemini.timeout_secs.unwrap_or(120),
            },
            marketer: MarketerSettings {
                api_key: env_var("PROMOGEN_MARKETER_API_KEY")
                    .or_else(|| file.marketer.api_key.clone())
                    .unwrap_or_default(),
                base_url: env_var("PROMOGEN_MARKETER_URL")
                    .or_else(|| file.marketer.base_url.clone())
                    .unwrap_or_else(|| DEFAULT_MARKETER_BASE_URL.to_string()),
                timeout_secs: file.marketer.timeout_secs.unwrap_or(180),
            },
            video: VideoSettings {
                api_key: env_var("PROMOGEN_VIDEO_API_KEY")
                    .or_else(|| file.video.api_key.clone())
                    .or_else(|| env_var("PROMOGEN_GEMINI_API_KEY"))
                    .or_else(|| file.gemini.api_key.clone())
                    .unwrap_or_default(),
                base_url: env_var("PROMOGEN_VIDEO_URL")
                    .or_else(|| file.video.base_url.clone())
                    .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
                model: file
                    .video
                    .model
                    .clone()
                    .unwrap_or_else(|| "veo-3.1-generate-preview".to_string()),
                poll_interval_secs: file.video.poll_interval_secs.unwrap_or(5),
            },
            scraper: ScraperSettings {
                base_url: env_var("PROMOGEN_SCRAPER_URL")
                    .or_else(|| file.scraper.base_url.clone())
                    .unwrap_or_else(|| DEFAULT_SCRAPER_BASE_URL.to_string()),
                timeout_secs: file.scraper.timeout_secs.unwrap_or(60),
            },
            fetch: FetchSettings {
                timeout_secs: file.fetch.timeout_secs.unwrap_or(15),
            },
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn default_media_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".promogen")
        .join("media")
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".promogen").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: Option<&Path>, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.unwrap_or(Path::new(".")).join(path)
    }
}
