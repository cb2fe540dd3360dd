//! Data models for harvested articles and their persisted representations.
//!
//! - [`ArticleRecord`]: metadata extracted from one article page
//! - [`StoredRow`]: an [`ArticleRecord`] keyed and stamped for a table store
//!
//! Field names of [`ArticleRecord`] are part of the output contract: the JSON
//! array written by the application uses exactly `url`, `heading`,
//! `subheading` and `date`, with absent values serialized as `null`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How long a stored row stays valid before the table store may expire it.
pub const ROW_RETENTION_DAYS: i64 = 90;

/// Metadata harvested from a single article page.
///
/// Each field is independently optional; a record missing its date is still
/// a valid record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Absolute URL of the article, as discovered on the listing page.
    pub url: String,
    /// The article headline.
    pub heading: Option<String>,
    /// Standfirst, description or first paragraph.
    pub subheading: Option<String>,
    /// Publication date, verbatim as the page states it.
    pub date: Option<String>,
}

impl ArticleRecord {
    /// A record with every metadata field absent.
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            heading: None,
            subheading: None,
            date: None,
        }
    }

    /// True when no tier produced any field.
    pub fn is_empty(&self) -> bool {
        self.heading.is_none() && self.subheading.is_none() && self.date.is_none()
    }
}

/// One row destined for the keyed table store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredRow {
    /// Hex-encoded SHA-256 of the article URL.
    pub record_key: String,
    pub url: String,
    pub heading: Option<String>,
    pub subheading: Option<String>,
    pub date: Option<String>,
    /// Capture time in RFC 3339.
    pub captured_at: String,
    /// Unix seconds after which the row may be expired.
    pub expires_at: i64,
}

impl StoredRow {
    pub fn from_record(record: &ArticleRecord, captured_at: DateTime<Utc>) -> Self {
        Self {
            record_key: record_key(&record.url),
            url: record.url.clone(),
            heading: record.heading.clone(),
            subheading: record.subheading.clone(),
            date: record.date.clone(),
            captured_at: captured_at.to_rfc3339(),
            expires_at: (captured_at + Duration::days(ROW_RETENTION_DAYS)).timestamp(),
        }
    }
}

/// Stable key for a URL: hex SHA-256 of its bytes.
pub fn record_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}
