//! Command-line interface definitions for the news harvester.
//!
//! Every option can also come from the environment, so scheduled runs can be
//! configured without touching the command line.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Rendering engine used to load listing and article pages.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// Headless Chrome over CDP; runs page scripts.
    Chromium,
    /// Plain HTTP fetch; no script execution.
    Http,
}

/// Command-line arguments for the news harvester.
///
/// # Examples
///
/// ```sh
/// # Harvest the built-in seed list with headless Chrome
/// news_harvester
///
/// # Custom seeds, archived copy and table rows
/// news_harvester -c sites.yaml --archive-dir ./archive --rows-file ./rows.ndjson
///
/// # No Chrome available
/// news_harvester --engine http -o ./scraped_data.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Where the JSON array of records is written
    #[arg(short, long, env = "OUTPUT_FILE", default_value = "/tmp/scraped_data.json")]
    pub output_file: PathBuf,

    /// Optional path to a YAML config (seed sites, limits, selectors)
    #[arg(short, long, env = "HARVEST_CONFIG")]
    pub config: Option<String>,

    /// Also write one NDJSON row per record, keyed by URL hash
    #[arg(long, env = "ROWS_FILE")]
    pub rows_file: Option<PathBuf>,

    /// Also copy the output into this directory under a timestamped name
    #[arg(long, env = "ARCHIVE_DIR")]
    pub archive_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Engine::Chromium)]
    pub engine: Engine,

    /// Chrome binary (auto-detected when omitted)
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// User-Agent for the `http` engine
    #[arg(long, env = "HARVEST_USER_AGENT")]
    pub user_agent: Option<String>,
}
