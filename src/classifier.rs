//! Heuristic test for "article-shaped" URLs.
//!
//! Runs on every raw anchor of a listing page, so it must stay cheap and
//! never touch the network. It is tuned for precision: every false positive
//! costs a full page render downstream, a false negative only costs one
//! missed article.
//!
//! Rules, first decisive rule wins (all on the lower-cased URL):
//!
//! 1. any blacklisted substring → reject
//! 2. no whitelisted substring → reject
//! 3. fewer than two `/` in the path → reject
//! 4. accept only if the path has a `-`, a four digit run, or two digits
//!    followed by `/`

use crate::config::ClassifierConfig;
use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
static DATE_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}/").unwrap());

/// Minimum number of `/` characters in the URL path.
const MIN_PATH_SEPARATORS: usize = 2;

#[derive(Debug, Clone)]
pub struct UrlClassifier {
    blacklist: Vec<String>,
    whitelist: Vec<String>,
}

impl Default for UrlClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl UrlClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            blacklist: config.blacklist.iter().map(|s| s.to_lowercase()).collect(),
            whitelist: config.whitelist.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Whether `url` plausibly identifies a single article page.
    pub fn is_article_like(&self, url: &str) -> bool {
        let url = url.to_lowercase();

        if self.blacklist.iter().any(|bad| url.contains(bad.as_str())) {
            return false;
        }

        if !self.whitelist.iter().any(|good| url.contains(good.as_str())) {
            return false;
        }

        let path = url_path(&url);
        if path.matches('/').count() < MIN_PATH_SEPARATORS {
            return false;
        }

        path.contains('-') || YEAR_LIKE.is_match(&path) || DATE_SEGMENT.is_match(&path)
    }
}

/// Path component of `url`, exactly as written.
///
/// The text is split rather than parsed so dot segments survive and
/// backslashes never act as separators: `/news/../2026-ai` keeps its three
/// `/`, and `https://example.com\news\a-b` has no path at all.
fn url_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let rest = &url[..end];
    let rest = match scheme_len(rest) {
        Some(len) => &rest[len + 1..],
        None => rest,
    };
    match rest.strip_prefix("//") {
        Some(authority_and_path) => authority_and_path
            .find('/')
            .map_or("", |i| &authority_and_path[i..]),
        None => rest,
    }
}

/// Length of a leading `scheme:` prefix, without the colon.
fn scheme_len(url: &str) -> Option<usize> {
    let colon = url.find(':')?;
    let scheme = &url[..colon];
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (starts_alpha && rest_valid).then_some(colon)
}
