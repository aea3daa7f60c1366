//! promogen - Campaign pipeline orchestrator
//!
//! Turns a single product-page URL into a finished short-form marketing
//! video by chaining several generative-AI calls, streaming a tagged log
//! of progress while the run is in flight.
//!
//! # Architecture
//!
//! A campaign runs five stages strictly in order:
//! - Intel: scrape the page, distill raw text into a product summary
//! - Trend: derive a research prompt, fetch a marketing-insight digest
//! - Script: write a short-form video script from the insights
//! - Image Selection: narrow scraped candidates to one validated image,
//!   or synthesize one
//! - Render: construct the video prompt and invoke the video backend
//!
//! The first stage failure terminates the run; callers always receive a
//! single terminal envelope plus the complete log up to that point.
//!
//! # Modules
//!
//! - `adapters`: Collaborator capabilities and their HTTP clients
//! - `core`: Orchestration logic (log emitter, selector, stages, orchestrator)
//! - `domain`: Data structures (Campaign, LogEntry, product types)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run a campaign
//! promogen run https://example.com/product
//!
//! # Inspect the inputs without paying for a render
//! promogen run https://example.com/product --skip-render
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::Services;
pub use config::Config;
pub use core::{CampaignError, CampaignLog, LogSink, MemorySink, Orchestrator};
pub use domain::{Campaign, CampaignStatus, LogEntry, LogTag, ResultBundle, Selection};
