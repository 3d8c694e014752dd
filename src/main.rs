//! # programtv_scrape
//!
//! Fetches today's TV schedule for a list of channels from programtv.ro and
//! writes it to a JSON file.
//!
//! ## Usage
//!
//! ```sh
//! programtv_scrape -o programtv_schedule.json
//! ```
//!
//! ## Architecture
//!
//! For each configured channel, in order:
//! 1. **Fetching**: one GET with a browser user agent and a timeout
//! 2. **Extracting**: listing rows (time, title, live badge) from the schedule panel
//! 3. **Normalizing**: rows become display strings via an ordered rule list
//!
//! The collected report is then written once, replacing the previous file.
//! A failing channel yields an empty list and never stops the run.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod cli;
mod config;
mod extractor;
mod fetcher;
mod models;
mod normalize;
mod outputs;
mod utils;

use aggregate::Aggregator;
use cli::Cli;
use extractor::ProgramTvLayout;
use fetcher::HttpFetcher;
use normalize::Normalizer;
use outputs::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("Scraping programtv.ro (current day)");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let channels = config::load_channels(args.channels.as_deref()).await?;
    let fetcher = HttpFetcher::new(&args.user_agent, Duration::from_secs(args.timeout_secs))?;
    let normalizer = Normalizer::new(args.policy);
    info!(policy = ?args.policy, rules = ?normalizer.rules(), "Normalization policy");

    let layout = ProgramTvLayout;
    let aggregator = Aggregator::new(&fetcher, &layout, normalizer, args.concurrency);
    let report = aggregator.scrape_all(&channels).await;

    json::write_report(&report, Path::new(&args.output)).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Done at {}",
        Local::now().format("%H:%M:%S")
    );

    Ok(())
}
