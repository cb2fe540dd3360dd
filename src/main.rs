//! # News Harvester
//!
//! Collects heading, subheading and publication date from news articles
//! linked off a list of seed sites, using a real browser so script-rendered
//! listings work too.
//!
//! ## Usage
//!
//! ```sh
//! news_harvester -o /tmp/scraped_data.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: render each seed and keep up to 15 same-domain,
//!    article-shaped links
//! 2. **Extraction**: open the links five at a time and read JSON-LD, then
//!    meta tags, then visible headings
//! 3. **Output**: write the JSON array, plus an optional archive copy and
//!    keyed rows for a table store

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod classifier;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod scrapers;
mod utils;

use browser::BrowserEngine;
use browser::chromium::{ChromiumEngine, ChromiumSettings};
use browser::http::HttpEngine;
use cli::{Cli, Engine};
use config::HarvestConfig;
use models::ArticleRecord;
use outputs::{json, rows};
use scrapers::Harvester;
use utils::ensure_writable_parent;

#[tokio::main]
#[instrument]
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

    let start_time = Instant::now();
    info!("news_harvester starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = HarvestConfig::load(args.config.as_deref()).await?;
    info!(
        sites = config.sites.len(),
        max_links_per_site = config.max_links_per_site,
        concurrent_articles = config.concurrent_articles,
        "Loaded configuration"
    );

    // Fail before scraping rather than after.
    if let Err(e) = ensure_writable_parent(&args.output_file).await {
        error!(
            path = %args.output_file.display(),
            error = %e,
            "Output location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let records = match args.engine {
        Engine::Chromium => {
            let settings = ChromiumSettings {
                chrome_path: args.chrome_path.clone(),
                headless: !args.headful,
                request_timeout: config.navigation_timeout(),
            };
            let engine = ChromiumEngine::launch(&settings).await?;
            let harvester = Harvester::new(engine, &config);
            let records = harvester.run(&config.sites).await;
            harvester.into_engine().shutdown().await;
            records
        }
        Engine::Http => {
            let engine = match &args.user_agent {
                Some(agent) => HttpEngine::new(agent.clone()),
                None => HttpEngine::default(),
            };
            harvest(engine, &config).await
        }
    };

    write_outputs(&args, &records).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        minutes = elapsed.as_secs() / 60,
        secs = elapsed.as_secs() % 60,
        articles = records.len(),
        "Execution complete"
    );

    Ok(())
}

async fn harvest<E: BrowserEngine>(engine: E, config: &HarvestConfig) -> Vec<ArticleRecord> {
    Harvester::new(engine, config).run(&config.sites).await
}

/// Write the JSON array, then the optional archive copy and rows.
///
/// Nothing is written when the run produced no records.
#[instrument(level = "info", skip_all, fields(count = records.len()))]
async fn write_outputs(args: &Cli, records: &[ArticleRecord]) -> Result<(), Box<dyn Error>> {
    if records.is_empty() {
        warn!("No articles scraped; nothing to write");
        return Ok(());
    }

    json::write_records(records, &args.output_file).await?;
    let captured_at = Utc::now();

    if let Some(dir) = &args.archive_dir {
        if let Err(e) = json::archive_output(&args.output_file, dir, captured_at).await {
            error!(dir = %dir.display(), error = %e, "Failed to archive output");
        }
    }

    if let Some(path) = &args.rows_file {
        let rows = rows::build_rows(records, captured_at);
        if let Err(e) = rows::write_rows(&rows, path).await {
            error!(path = %path.display(), error = %e, "Failed to write table rows");
        }
    }

    Ok(())
}
