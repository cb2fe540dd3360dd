//! Candidate article discovery on a listing page.
//!
//! Anchors are gathered from a list of selectors biased toward article
//! containers (at most `links_per_selector` from each). If none of them match,
//! every anchor on the page is used instead. Collected hrefs are resolved
//! against the seed URL, restricted to the seed's domain, passed through the
//! [`UrlClassifier`], deduplicated and capped.
//!
//! Discovery never fails outward: a seed that cannot be loaded or queried
//! yields no links and the run moves on.

use crate::browser::{ElementHandle, PageHandle};
use crate::classifier::UrlClassifier;
use crate::config::HarvestConfig;
use crate::error::BrowserError;
use itertools::Itertools;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Used when no targeted selector matched anything.
const ALL_ANCHORS: &str = "a[href]";

/// Links echoed at debug level after filtering.
const SAMPLE_SIZE: usize = 3;

#[derive(Debug, Clone)]
pub struct LinkDiscovery {
    listing_selectors: Vec<String>,
    links_per_selector: usize,
    max_links: usize,
    classifier: UrlClassifier,
    navigation_timeout: Duration,
    idle_timeout: Duration,
}

impl LinkDiscovery {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            listing_selectors: config.selectors.listing.clone(),
            links_per_selector: config.links_per_selector,
            max_links: config.max_links_per_site,
            classifier: UrlClassifier::new(&config.classifier),
            navigation_timeout: config.navigation_timeout(),
            idle_timeout: config.listing_idle_timeout(),
        }
    }

    #[cfg(test)]
    pub fn with_timeouts(mut self, navigation: Duration, idle: Duration) -> Self {
        self.navigation_timeout = navigation;
        self.idle_timeout = idle;
        self
    }

    /// Load `base_url` in `page` and return up to `max_links` candidate
    /// article URLs, in first-seen order.
    ///
    /// # Arguments
    ///
    /// * `page` - A page in the site's browsing context; left on the listing
    /// * `base_url` - The seed listing URL; relative hrefs resolve against it
    ///
    /// # Returns
    ///
    /// Absolute, same-domain, article-shaped URLs. Empty when the seed is
    /// invalid, unreachable or cannot be queried; the cause is logged.
    #[instrument(level = "info", skip_all, fields(site = %base_url))]
    pub async fn discover<P: PageHandle>(&self, page: &P, base_url: &str) -> Vec<String> {
        info!("Scanning listing page");
        match self.try_discover(page, base_url).await {
            Ok(links) => links,
            Err(e) => {
                warn!(error = %e, "Link discovery failed");
                Vec::new()
            }
        }
    }

    async fn try_discover<P: PageHandle>(
        &self,
        page: &P,
        base_url: &str,
    ) -> Result<Vec<String>, BrowserError> {
        let invalid_seed = |reason: String| BrowserError::Navigation {
            url: base_url.to_string(),
            reason,
        };
        let base = Url::parse(base_url).map_err(|e| invalid_seed(e.to_string()))?;
        if base.host_str().is_none() {
            return Err(invalid_seed("seed URL has no host".to_string()));
        }

        page.goto(base_url, self.navigation_timeout).await?;
        if let Err(e) = page.wait_for_idle(self.idle_timeout).await {
            debug!(error = %e, "Listing page never went idle; scanning anyway");
        }

        let raw = self.collect_hrefs(page).await?;
        info!(count = raw.len(), "Raw links found");

        let links = self.filter_links(&base, raw);
        info!(count = links.len(), "Valid article links");
        for link in links.iter().take(SAMPLE_SIZE) {
            debug!(%link, "Sample article link");
        }
        Ok(links)
    }

    /// Distinct raw hrefs from the targeted selectors, or from every anchor
    /// when the targeted selectors found nothing.
    async fn collect_hrefs<P: PageHandle>(&self, page: &P) -> Result<Vec<String>, BrowserError> {
        let mut hrefs = Vec::new();

        for selector in &self.listing_selectors {
            let elements = match page.query_selector_all(selector).await {
                Ok(elements) => elements,
                Err(e) if e.is_recoverable() => {
                    debug!(%selector, error = %e, "Skipping listing selector");
                    continue;
                }
                Err(e) => return Err(e),
            };
            for element in elements.iter().take(self.links_per_selector) {
                match element.attribute("href").await {
                    Ok(Some(href)) if !href.is_empty() => hrefs.push(href),
                    Ok(_) => {}
                    Err(e) if e.is_recoverable() => {
                        debug!(%selector, error = %e, "Skipping unreadable anchor");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if !hrefs.is_empty() {
            return Ok(hrefs.into_iter().unique().collect());
        }

        debug!("No targeted anchors; falling back to every link on the page");
        match page.resolved_hrefs(ALL_ANCHORS).await {
            Ok(all) => Ok(all.into_iter().filter(|h| !h.is_empty()).unique().collect()),
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "Fallback anchor scan failed");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve against `base`, keep same-domain article-shaped URLs,
    /// deduplicate and cap.
    pub fn filter_links(&self, base: &Url, hrefs: impl IntoIterator<Item = String>) -> Vec<String> {
        let base_domain = netloc(base);
        hrefs
            .into_iter()
            .filter_map(|href| base.join(&href).ok())
            .filter(|resolved| netloc(resolved).contains(&base_domain))
            .map(String::from)
            .filter(|resolved| self.classifier.is_article_like(resolved))
            .unique()
            .take(self.max_links)
            .collect()
    }
}

/// Host plus explicit port, the part of the URL compared across links.
fn netloc(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}
