//! Metadata extraction from a single article page.
//!
//! Three tiers, each consulted only for fields still missing:
//!
//! 1. JSON-LD with an article `@type` (`headline`, `description`, `datePublished`)
//! 2. Open Graph style `<meta>` tags (`og:title`, `og:description`,
//!    `article:published_time`)
//! 3. DOM selectors, first match whose trimmed text is longer than five
//!    characters
//!
//! Every field is whitespace-normalized at the end. A recoverable engine
//! error (timeout, bad selector, vanished node) skips to the next source;
//! anything else fails the article.

use super::structured::{ArticleFields, STRUCTURED_DATA_SELECTOR, StructuredData};
use crate::browser::{BrowsingContext, ElementHandle, PageHandle};
use crate::config::{HarvestConfig, SelectorConfig};
use crate::error::BrowserError;
use crate::models::ArticleRecord;
use crate::utils::{normalize_whitespace, truncate_for_log};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// DOM-tier text must be strictly longer than this, in characters.
const MIN_TEXT_CHARS: usize = 5;

const META_TITLE: &str = "og:title";
const META_DESCRIPTION: &str = "og:description";
const META_PUBLISHED: &str = "article:published_time";

#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    selectors: SelectorConfig,
    navigation_timeout: Duration,
    idle_timeout: Duration,
}

impl MetadataExtractor {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            selectors: config.selectors.clone(),
            navigation_timeout: config.navigation_timeout(),
            idle_timeout: config.article_idle_timeout(),
        }
    }

    #[cfg(test)]
    pub fn with_timeouts(mut self, navigation: Duration, idle: Duration) -> Self {
        self.navigation_timeout = navigation;
        self.idle_timeout = idle;
        self
    }

    /// Open a page in `context`, load `url` and extract its metadata.
    ///
    /// The page is closed on every exit path. A network-idle wait that never
    /// settles is logged and extraction proceeds on what has loaded.
    ///
    /// # Arguments
    ///
    /// * `context` - The site's browsing context; one page is opened in it
    /// * `url` - Absolute article URL
    ///
    /// # Returns
    ///
    /// The record, possibly with every field absent, or the navigation or
    /// non-recoverable engine error that failed this article.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn scrape<C: BrowsingContext>(
        &self,
        context: &C,
        url: &str,
    ) -> Result<ArticleRecord, BrowserError> {
        let page = context.new_page().await?;
        let result = self.load_and_extract(&page, url).await;
        if let Err(e) = page.close().await {
            debug!(error = %e, "Failed to close article page");
        }

        match &result {
            Ok(record) => info!(
                heading = %truncate_for_log(record.heading.as_deref().unwrap_or("No heading"), 80),
                "Scraped article"
            ),
            Err(e) => warn!(error = %e, "Article scrape failed"),
        }
        result
    }

    async fn load_and_extract<P: PageHandle>(
        &self,
        page: &P,
        url: &str,
    ) -> Result<ArticleRecord, BrowserError> {
        page.goto(url, self.navigation_timeout).await?;
        if let Err(e) = page.wait_for_idle(self.idle_timeout).await {
            debug!(error = %e, "Network never went idle; extracting anyway");
        }
        self.extract(page, url).await
    }

    /// Run the fallback chain against an already loaded page.
    pub async fn extract<P: PageHandle>(
        &self,
        page: &P,
        url: &str,
    ) -> Result<ArticleRecord, BrowserError> {
        let mut record = ArticleRecord::empty(url);

        if let Some(fields) = self.structured_data(page).await? {
            record.heading = fields.headline;
            record.subheading = fields.description;
            record.date = fields.date_published;
        }

        if record.heading.is_none() {
            record.heading = meta_content(page, META_TITLE).await?;
        }
        if record.subheading.is_none() {
            record.subheading = meta_content(page, META_DESCRIPTION).await?;
        }
        if record.date.is_none() {
            record.date = meta_content(page, META_PUBLISHED).await?;
        }

        if record.heading.is_none() {
            record.heading = first_text(page, &self.selectors.heading).await?;
        }
        if record.subheading.is_none() {
            record.subheading = first_text(page, &self.selectors.subheading).await?;
        }
        if record.date.is_none() {
            record.date = first_text(page, &self.selectors.date).await?;
        }

        Ok(normalize_record(record))
    }

    /// First article object across all JSON-LD scripts on the page.
    async fn structured_data<P: PageHandle>(
        &self,
        page: &P,
    ) -> Result<Option<ArticleFields>, BrowserError> {
        let scripts = match page.query_selector_all(STRUCTURED_DATA_SELECTOR).await {
            Ok(scripts) => scripts,
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "Structured data query failed");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        for script in &scripts {
            let Some(raw) = recover(script.text_content().await, "structured data text")? else {
                continue;
            };
            match StructuredData::parse(&raw) {
                StructuredData::Malformed => {
                    debug!(bytes = raw.len(), "Skipping malformed structured data");
                }
                data => {
                    if let Some(fields) = data.find_article(&self.selectors.article_types) {
                        return Ok(Some(fields));
                    }
                }
            }
        }
        Ok(None)
    }
}

/// `content` of the first `<meta>` whose `property` or `name` is `name`.
async fn meta_content<P: PageHandle>(page: &P, name: &str) -> Result<Option<String>, BrowserError> {
    let selector = format!("meta[property='{name}'], meta[name='{name}']");
    let Some(element) = recover(page.query_selector(&selector).await, &selector)? else {
        return Ok(None);
    };
    let content = recover(element.attribute("content").await, &selector)?;
    Ok(content.filter(|c| !c.trim().is_empty()))
}

/// Trimmed text of the first selector match longer than [`MIN_TEXT_CHARS`].
async fn first_text<P: PageHandle>(
    page: &P,
    selectors: &[String],
) -> Result<Option<String>, BrowserError> {
    for selector in selectors {
        let Some(element) = recover(page.query_selector(selector).await, selector)? else {
            continue;
        };
        let Some(text) = recover(element.text_content().await, selector)? else {
            continue;
        };
        let text = text.trim();
        if text.chars().count() > MIN_TEXT_CHARS {
            return Ok(Some(text.to_string()));
        }
    }
    Ok(None)
}

/// Treat a recoverable failure as "nothing found here".
fn recover<T>(
    result: Result<Option<T>, BrowserError>,
    what: &str,
) -> Result<Option<T>, BrowserError> {
    match result {
        Err(e) if e.is_recoverable() => {
            debug!(error = %e, what, "Skipping source");
            Ok(None)
        }
        other => other,
    }
}

fn normalize_record(record: ArticleRecord) -> ArticleRecord {
    let clean = |field: Option<String>| field.map(|s| normalize_whitespace(&s));
    ArticleRecord {
        url: record.url,
        heading: clean(record.heading),
        subheading: clean(record.subheading),
        date: clean(record.date),
    }
}
