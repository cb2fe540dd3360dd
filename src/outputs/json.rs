//! JSON array output.
//!
//! The array is the run's artifact: field names `url`, `heading`,
//! `subheading`, `date`, missing values as `null`, non-ASCII text kept
//! verbatim.

use crate::models::ArticleRecord;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `records` as a pretty-printed JSON array into `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_records(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(records)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!("Wrote article records");
    Ok(())
}

/// Archive file name for a run captured at `captured_at`.
pub fn archive_file_name(captured_at: DateTime<Utc>) -> String {
    format!("scraped_data_{}.json", captured_at.timestamp())
}

/// Copy the written output file into `archive_dir` under a timestamped name.
///
/// Returns the archive path.
#[instrument(level = "info", skip_all, fields(archive_dir = %archive_dir.display()))]
pub async fn archive_output(
    output_file: &Path,
    archive_dir: &Path,
    captured_at: DateTime<Utc>,
) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(archive_dir).await?;
    let target = archive_dir.join(archive_file_name(captured_at));
    fs::copy(output_file, &target).await?;
    info!(path = %target.display(), "Archived output");
    Ok(target)
}
