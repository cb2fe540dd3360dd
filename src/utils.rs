//! Utility functions for text cleanup, logging and file system checks.
//!
//! - Whitespace normalization applied to every extracted field
//! - String truncation for log lines
//! - File system validation for the output location

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run to a single space and trim the ends.
///
/// Idempotent: normalizing an already-normalized string returns it unchanged.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_whitespace("  Breaking:\n\tAI   rules "), "Breaking: AI rules");
/// ```
pub fn normalize_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").trim().to_string()
}

/// Truncate a string for logging purposes.
///
/// Counts characters rather than bytes so multi-byte headlines never split
/// inside a code point.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", head, total - max)
    }
}

/// Ensure the directory that will hold `file_path` exists and is writable.
///
/// Creates the parent directory if needed, then writes and removes a scratch
/// file next to the target.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %file_path.display()))]
pub async fn ensure_writable_parent(file_path: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let scratch_path = dir.join("..__write_check__");
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!(dir = %dir.display(), "Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace_collapses_runs() {
        assert_eq!(
            normalize_whitespace("  Breaking:\n\tAI   rules \r\n"),
            "Breaking: AI rules"
        );
        assert_eq!(normalize_whitespace("\u{a0}Feb\u{a0}\u{a0}12"), "Feb 12");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_normalize_whitespace_is_idempotent() {
        for s in ["a  b", "\n x \t y \n", "already clean", "", "नई  दिल्ली\n समाचार"] {
            let once = normalize_whitespace(s);
            assert_eq!(normalize_whitespace(&once), once);
        }
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.ends_with("…(+400 chars)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let s = "समाचार".repeat(20);
        let result = truncate_for_log(&s, 7);
        assert!(result.starts_with("समाचार"));
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/deeper/out.json");
        ensure_writable_parent(&target).await.unwrap();
        assert!(dir.path().join("nested/deeper").is_dir());
    }
}
