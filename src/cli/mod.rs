//! Command-line interface for promogen.
//!
//! Provides commands for running a campaign against a product URL
//! (streaming log entries to stderr as they happen, printing the
//! terminal envelope as JSON to stdout) and inspecting the resolved
//! configuration.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::adapters::Services;
use crate::config::Config;
use crate::core::{LogSink, Orchestrator};
use crate::domain::LogEntry;

/// promogen - Campaign pipeline orchestrator
#[derive(Parser, Debug)]
#[command(name = "promogen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a campaign for a product-page URL
    Run {
        /// The product page to build a marketing video for
        url: String,

        /// Prepare the video prompt and image but skip the final render
        #[arg(long)]
        skip_render: bool,

        /// Suppress the live log stream on stderr
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Streams each log entry to stderr as it is recorded.
struct StderrSink;

impl LogSink for StderrSink {
    fn accept(&self, entry: &LogEntry) {
        eprintln!("[{}] {}", entry.tag, entry.message);
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                url,
                skip_render,
                quiet,
            } => run_campaign(&url, skip_render, quiet).await,
            Commands::Config => show_config(),
        }
    }
}

/// Run one campaign to its terminal outcome
async fn run_campaign(url: &str, skip_render: bool, quiet: bool) -> Result<()> {
    let config = Config::load()?;
    let orchestrator = Orchestrator::new(Services::from_config(&config)?);

    let sink: Option<Arc<dyn LogSink>> = if quiet {
        None
    } else {
        Some(Arc::new(StderrSink))
    };

    let campaign = orchestrator.run(url, skip_render, sink).await;

    println!("{}", serde_json::to_string_pretty(&campaign)?);

    if !campaign.succeeded() {
        eprintln!(
            "\n[Campaign {} failed: {}]",
            campaign.id,
            campaign.error().unwrap_or("unknown error")
        );
        std::process::exit(1);
    }

    eprintln!("\n[Campaign {} completed successfully]", campaign.id);
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("promogen configuration");
    println!();
    println!("Media dir:        {}", config.media_dir.display());
    println!();
    println!("Text/vision backend:");
    println!("  Base URL:       {}", config.gemini.base_url);
    println!("  Text model:     {}", config.gemini.text_model);
    println!("  Image model:    {}", config.gemini.image_model);
    println!("  API key:        {}", mask(&config.gemini.api_key));
    println!();
    println!("Insights backend:");
    println!("  Base URL:       {}", config.marketer.base_url);
    println!("  API key:        {}", mask(&config.marketer.api_key));
    println!();
    println!("Video backend:");
    println!("  Base URL:       {}", config.video.base_url);
    println!("  Model:          {}", config.video.model);
    println!("  Poll interval:  {}s", config.video.poll_interval_secs);
    println!("  API key:        {}", mask(&config.video.api_key));
    println!();
    println!("Scraper service:  {}", config.scraper.base_url);

    Ok(())
}

/// Mask a credential for display
fn mask(key: &str) -> String {
    let len = key.chars().count();
    if key.is_empty() {
        "(not set)".to_string()
    } else if len <= 8 {
        "*".repeat(len)
    } else {
        let head: String = key.chars().take(4).collect();
        let tail: String = key.chars().skip(len - 4).collect();
        format!("{}…{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_short_and_long_keys() {
        assert_eq!(mask(""), "(not set)");
        assert_eq!(mask("abcd"), "****");
        assert_eq!(mask("AIzaSyExampleKey1234"), "AIza…1234");
    }
}
