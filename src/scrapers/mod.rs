//! The harvesting pipeline.
//!
//! Each seed site goes through the same three phases, one site at a time:
//!
//! 1. **Discovery**: load the listing page and collect candidate article
//!    links ([`links`])
//! 2. **Extraction**: open every candidate in its own page and pull heading,
//!    subheading and date ([`article`], [`structured`]), at most
//!    `concurrent_articles` at once
//! 3. **Aggregation**: keep the successful records in completion order
//!
//! Each site gets a fresh browsing context, closed before the next site
//! starts. Failures stay where they happen: a broken article drops that
//! article, a broken listing page drops that site.

pub mod article;
pub mod links;
pub mod structured;

use crate::browser::{BrowserEngine, BrowsingContext, PageHandle};
use crate::config::HarvestConfig;
use crate::models::ArticleRecord;
use article::MetadataExtractor;
use futures::stream::{self, StreamExt};
use links::LinkDiscovery;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

pub struct Harvester<E> {
    engine: E,
    discovery: LinkDiscovery,
    extractor: MetadataExtractor,
    concurrency: usize,
}

impl<E: BrowserEngine> Harvester<E> {
    pub fn new(engine: E, config: &HarvestConfig) -> Self {
        Self::from_parts(
            engine,
            LinkDiscovery::new(config),
            MetadataExtractor::new(config),
            config.concurrent_articles,
        )
    }

    /// `concurrency` is clamped to at least one.
    pub fn from_parts(
        engine: E,
        discovery: LinkDiscovery,
        extractor: MetadataExtractor,
        concurrency: usize,
    ) -> Self {
        Self {
            engine,
            discovery,
            extractor,
            concurrency: concurrency.max(1),
        }
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Harvest every seed in order and return all records.
    ///
    /// Never fails: sites and articles that cannot be scraped are logged and
    /// skipped, so an empty result is a normal outcome.
    ///
    /// # Arguments
    ///
    /// * `sites` - Seed listing URLs, processed one at a time in this order
    ///
    /// # Returns
    ///
    /// Records grouped by site in seed order; within a site, in the order
    /// their extractions finished. The same URL may appear once per site.
    #[instrument(level = "info", skip_all, fields(sites = sites.len()))]
    pub async fn run(&self, sites: &[String]) -> Vec<ArticleRecord> {
        let mut results = Vec::new();

        for site in sites {
            let started = Instant::now();
            let records = self.harvest_site(site).await;
            info!(
                %site,
                records = records.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Site completed"
            );
            results.extend(records);
        }

        info!(total = results.len(), "Harvest run complete");
        results
    }

    #[instrument(level = "info", skip_all, fields(%site))]
    async fn harvest_site(&self, site: &str) -> Vec<ArticleRecord> {
        let context = match self.engine.new_context().await {
            Ok(context) => context,
            Err(e) => {
                error!(error = %e, "Could not open a browsing context; skipping site");
                return Vec::new();
            }
        };

        let links = match context.new_page().await {
            Ok(page) => {
                let links = self.discovery.discover(&page, site).await;
                if let Err(e) = page.close().await {
                    debug!(error = %e, "Failed to close listing page");
                }
                links
            }
            Err(e) => {
                warn!(error = %e, "Could not open a listing page");
                Vec::new()
            }
        };

        let records = self.extract_all(&context, &links).await;

        if let Err(e) = context.close().await {
            warn!(error = %e, "Failed to close browsing context");
        }
        records
    }

    /// Scrape `links` with at most `concurrency` in flight.
    ///
    /// Admission follows `links` order; the result follows completion order.
    async fn extract_all<C: BrowsingContext>(
        &self,
        context: &C,
        links: &[String],
    ) -> Vec<ArticleRecord> {
        let total = links.len();

        let outcomes: Vec<Option<ArticleRecord>> = stream::iter(links)
            .map(|link| async move {
                match self.extractor.scrape(context, link).await {
                    Ok(record) if record.is_empty() => {
                        warn!(url = %link, "No metadata found; dropping article");
                        None
                    }
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(url = %link, error = %e, "Failed to scrape article");
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let records: Vec<ArticleRecord> = outcomes.into_iter().flatten().collect();
        info!(
            total,
            successful = records.len(),
            failed = total - records.len(),
            "Completed article extraction"
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fixtures::{FixtureEngine, FixtureWeb, QueryFault, json_ld_article};
    use std::time::Duration;

    const SITE_A: &str = "https://news.example.com/latest";
    const SITE_B: &str = "https://press.example.org/releases";

    fn harvester(web: FixtureWeb, concurrency: usize) -> Harvester<FixtureEngine> {
        let config = HarvestConfig::default();
        let fast = |d: LinkDiscovery| d.with_timeouts(Duration::from_millis(200), Duration::from_millis(20));
        Harvester::from_parts(
            FixtureEngine::new(web),
            fast(LinkDiscovery::new(&config)),
            MetadataExtractor::new(&config)
                .with_timeouts(Duration::from_millis(500), Duration::from_millis(20)),
            concurrency,
        )
    }

    fn listing(hrefs: &[&str]) -> String {
        let anchors: String = hrefs
            .iter()
            .map(|h| format!(r#"<article><a href="{h}">link</a></article>"#))
            .collect();
        format!("<html><body>{anchors}</body></html>")
    }

    fn seeds(sites: &[&str]) -> Vec<String> {
        sites.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_end_to_end_completion_order() {
        let slow = "https://news.example.com/news/2026/02/ai-mission-approved";
        let fast = "https://news.example.com/news/2026/02/chip-fab-opens";
        let web = FixtureWeb::new()
            .page(SITE_A, &listing(&[slow, fast, "/news/login"]))
            .slow_page(
                slow,
                &json_ld_article("Mission approved", "Cabinet clears plan", "2026-02-11"),
                Duration::from_millis(120),
            )
            .slow_page(
                fast,
                &json_ld_article("Chip fab opens", "First unit online", "2026-02-12"),
                Duration::from_millis(10),
            );
        let harvester = harvester(web, 5);

        let records = harvester.run(&seeds(&[SITE_A])).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url, fast);
        assert_eq!(records[1].url, slow);
        for record in &records {
            assert!(record.heading.is_some());
            assert!(record.subheading.is_some());
            assert!(record.date.is_some());
        }
        assert_eq!(records[0].heading.as_deref(), Some("Chip fab opens"));
    }

    #[tokio::test]
    async fn test_listing_timeout_moves_to_next_site() {
        let article = "https://press.example.org/releases/2026/ai-policy-notice";
        let web = FixtureWeb::new()
            .slow_page(SITE_A, &listing(&["/news/2026/02/never-seen"]), Duration::from_secs(5))
            .page(SITE_B, &listing(&[article]))
            .page(article, &json_ld_article("Policy notice", "Details", "2026-02-01"));
        let harvester = harvester(web, 5);

        let records = harvester.run(&seeds(&[SITE_A, SITE_B])).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, article);

        let engine = harvester.into_engine();
        assert_eq!(engine.counters().contexts_opened(), 2);
        assert_eq!(engine.counters().contexts_closed(), 2);
        assert_eq!(engine.counters().pages_opened(), engine.counters().pages_closed());
    }

    #[tokio::test]
    async fn test_failed_and_empty_articles_are_excluded() {
        let good = "https://news.example.com/news/2026/02/good-story";
        let broken = "https://news.example.com/news/2026/02/broken-story";
        let bare = "https://news.example.com/news/2026/02/bare-story";
        let web = FixtureWeb::new()
            .page(SITE_A, &listing(&[good, broken, bare]))
            .page(good, &json_ld_article("Good story", "Desc", "2026-02-01"))
            .failing_page(broken)
            .page(bare, "<html><body><p>tiny</p></body></html>");
        let harvester = harvester(web, 5);

        let records = harvester.run(&seeds(&[SITE_A])).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, good);
    }

    #[tokio::test]
    async fn test_fatal_query_error_drops_only_that_article() {
        let complete = "https://news.example.com/news/2026/02/complete-story";
        let partial = "https://news.example.com/news/2026/02/partial-story";
        let web = FixtureWeb::new()
            .page(SITE_A, &listing(&[complete, partial]))
            .page(complete, &json_ld_article("Complete story", "Desc", "2026-02-01"))
            .page(partial, "<html><body><h1>Only a DOM heading</h1></body></html>")
            .failing_selector(
                "meta[property='og:title'], meta[name='og:title']",
                QueryFault::Protocol,
            );
        let harvester = harvester(web, 5);

        let records = harvester.run(&seeds(&[SITE_A])).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, complete);
        let engine = harvester.into_engine();
        assert_eq!(engine.counters().pages_opened(), engine.counters().pages_closed());
    }

    #[tokio::test]
    async fn test_never_idle_site_still_harvested() {
        let article = "https://news.example.com/news/2026/02/busy-page-story";
        let web = FixtureWeb::new()
            .page(SITE_A, &listing(&[article]))
            .page(article, &json_ld_article("Busy page story", "Desc", "2026-02-01"))
            .never_idle();
        let harvester = harvester(web, 5);

        let records = harvester.run(&seeds(&[SITE_A])).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].heading.as_deref(), Some("Busy page story"));
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let urls: Vec<String> = (0..12)
            .map(|i| format!("https://news.example.com/news/2026/02/story-{i}"))
            .collect();
        let hrefs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let mut web = FixtureWeb::new().page(SITE_A, &listing(&hrefs));
        for url in &urls {
            web = web.slow_page(
                url,
                &json_ld_article("Story headline", "Desc", "2026-02-01"),
                Duration::from_millis(30),
            );
        }

        let mut config = HarvestConfig::default();
        config.max_links_per_site = 12;
        let harvester = Harvester::from_parts(
            FixtureEngine::new(web),
            LinkDiscovery::new(&config),
            MetadataExtractor::new(&config),
            5,
        );

        let records = harvester.run(&seeds(&[SITE_A])).await;

        assert_eq!(records.len(), 12);
        let engine = harvester.into_engine();
        assert_eq!(engine.web().peak_in_flight(), 5);
    }

    #[tokio::test]
    async fn test_sites_run_in_seed_order_without_global_dedup() {
        let shared = "https://news.example.com/news/2026/02/shared-story";
        let second_listing = "https://news.example.com/more";
        let web = FixtureWeb::new()
            .page(SITE_A, &listing(&[shared]))
            .page(second_listing, &listing(&[shared]))
            .page(shared, &json_ld_article("Shared story", "Desc", "2026-02-01"));
        let harvester = harvester(web, 5);

        let records = harvester.run(&seeds(&[SITE_A, second_listing])).await;

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.url == shared));

        let engine = harvester.into_engine();
        assert_eq!(
            engine.web().fetched(),
            vec![SITE_A, shared, second_listing, shared]
        );
    }

    #[tokio::test]
    async fn test_no_seeds_no_records() {
        let harvester = harvester(FixtureWeb::new(), 5);
        assert!(harvester.run(&[]).await.is_empty());
    }
}
