//! Keyed rows for the table store.
//!
//! Each record becomes one [`StoredRow`] keyed by the SHA-256 of its URL and
//! stamped with the capture time and a 90-day expiry. Rows are written as
//! newline-delimited JSON so a loader can stream them.

use crate::models::{ArticleRecord, StoredRow};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub fn build_rows(records: &[ArticleRecord], captured_at: DateTime<Utc>) -> Vec<StoredRow> {
    records
        .iter()
        .map(|record| StoredRow::from_record(record, captured_at))
        .collect()
}

/// Write `rows` to `path` as newline-delimited JSON, replacing any
/// existing file.
///
/// # Arguments
///
/// * `rows` - Rows built by [`build_rows`]
/// * `path` - Destination file; missing parent directories are created
///
/// # Errors
///
/// Returns an error if a row cannot be serialized or the file cannot be
/// written.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = rows.len()))]
pub async fn write_rows(rows: &[StoredRow], path: &Path) -> Result<(), Box<dyn Error>> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }
    fs::write(path, out).await?;
    info!("Wrote table rows");
    Ok(())
}
