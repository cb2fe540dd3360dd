//! In-memory engine for tests.
//!
//! Serves canned HTML per URL with optional latency and failures, and keeps
//! counters for concurrency and resource-release assertions. Pages can also
//! be told to never go idle, or to fail fatally on chosen selectors.

use super::static_html::{DocumentSource, FetchedDocument, HtmlPage, StaticElement};
use super::{BrowserEngine, BrowsingContext, PageHandle};
use crate::error::BrowserError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
enum Response {
    Html(String),
    Fail,
}

#[derive(Debug, Clone)]
struct Route {
    response: Response,
    delay: Duration,
}

/// Fatal error returned for a selector registered with
/// [`FixtureWeb::failing_selector`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum QueryFault {
    Protocol,
    ContextClosed,
}

impl QueryFault {
    fn to_error(self) -> BrowserError {
        match self {
            Self::Protocol => BrowserError::Protocol("websocket closed".to_string()),
            Self::ContextClosed => BrowserError::ContextClosed,
        }
    }
}

#[derive(Default)]
pub(crate) struct FixtureWeb {
    routes: HashMap<String, Route>,
    never_idle: bool,
    failing_selectors: HashMap<String, QueryFault>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    fetched: Mutex<Vec<String>>,
}

impl FixtureWeb {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(self, url: &str, html: &str) -> Self {
        self.slow_page(url, html, Duration::ZERO)
    }

    pub(crate) fn slow_page(mut self, url: &str, html: &str, delay: Duration) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                response: Response::Html(html.to_string()),
                delay,
            },
        );
        self
    }

    pub(crate) fn failing_page(mut self, url: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                response: Response::Fail,
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Every `wait_for_idle` times out.
    pub(crate) fn never_idle(mut self) -> Self {
        self.never_idle = true;
        self
    }

    /// Queries for exactly `selector` fail with `fault` on every page.
    pub(crate) fn failing_selector(mut self, selector: &str, fault: QueryFault) -> Self {
        self.failing_selectors.insert(selector.to_string(), fault);
        self
    }

    fn check_selector(&self, selector: &str) -> Result<(), BrowserError> {
        match self.failing_selectors.get(selector) {
            Some(fault) => Err(fault.to_error()),
            None => Ok(()),
        }
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DocumentSource for FixtureWeb {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, BrowserError> {
        self.fetched.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let route = self.routes.get(url).cloned().ok_or_else(|| BrowserError::Navigation {
            url: url.to_string(),
            reason: "404 Not Found".to_string(),
        })?;
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        match route.response {
            Response::Html(html) => Ok(FetchedDocument {
                url: Url::parse(url).map_err(|e| BrowserError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?,
                html,
            }),
            Response::Fail => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub(crate) struct Counters {
    contexts_opened: AtomicUsize,
    contexts_closed: AtomicUsize,
    pages_opened: AtomicUsize,
    pages_closed: AtomicUsize,
}

impl Counters {
    pub(crate) fn contexts_opened(&self) -> usize {
        self.contexts_opened.load(Ordering::SeqCst)
    }

    pub(crate) fn contexts_closed(&self) -> usize {
        self.contexts_closed.load(Ordering::SeqCst)
    }

    pub(crate) fn pages_opened(&self) -> usize {
        self.pages_opened.load(Ordering::SeqCst)
    }

    pub(crate) fn pages_closed(&self) -> usize {
        self.pages_closed.load(Ordering::SeqCst)
    }
}

pub(crate) struct FixtureEngine {
    web: Arc<FixtureWeb>,
    counters: Arc<Counters>,
}

impl FixtureEngine {
    pub(crate) fn new(web: FixtureWeb) -> Self {
        Self {
            web: Arc::new(web),
            counters: Arc::new(Counters::default()),
        }
    }

    pub(crate) fn web(&self) -> &FixtureWeb {
        &self.web
    }

    pub(crate) fn counters(&self) -> &Counters {
        &self.counters
    }
}

impl BrowserEngine for FixtureEngine {
    type Context = FixtureContext;

    async fn new_context(&self) -> Result<FixtureContext, BrowserError> {
        self.counters.contexts_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FixtureContext {
            web: Arc::clone(&self.web),
            counters: Arc::clone(&self.counters),
        })
    }
}

pub(crate) struct FixtureContext {
    web: Arc<FixtureWeb>,
    counters: Arc<Counters>,
}

impl BrowsingContext for FixtureContext {
    type Page = FixturePage;

    async fn new_page(&self) -> Result<FixturePage, BrowserError> {
        self.counters.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FixturePage {
            inner: HtmlPage::new(Arc::clone(&self.web)),
            web: Arc::clone(&self.web),
            counters: Arc::clone(&self.counters),
        })
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.counters.contexts_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// [`HtmlPage`] that records its own release.
pub(crate) struct FixturePage {
    inner: HtmlPage<FixtureWeb>,
    web: Arc<FixtureWeb>,
    counters: Arc<Counters>,
}

impl PageHandle for FixturePage {
    type Element = StaticElement;

    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.inner.goto(url, timeout).await
    }

    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), BrowserError> {
        if self.web.never_idle {
            return Err(BrowserError::timeout("network idle", timeout));
        }
        self.inner.wait_for_idle(timeout).await
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<StaticElement>, BrowserError> {
        self.web.check_selector(selector)?;
        self.inner.query_selector(selector).await
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<StaticElement>, BrowserError> {
        self.web.check_selector(selector)?;
        self.inner.query_selector_all(selector).await
    }

    async fn resolved_hrefs(&self, selector: &str) -> Result<Vec<String>, BrowserError> {
        self.web.check_selector(selector)?;
        self.inner.resolved_hrefs(selector).await
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.counters.pages_closed.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }
}

/// Minimal article page carrying one JSON-LD block.
pub(crate) fn json_ld_article(headline: &str, description: &str, date: &str) -> String {
    format!(
        r#"<html><head>
<script type="application/ld+json">{{"@context":"https://schema.org","@type":"NewsArticle","headline":"{headline}","description":"{description}","datePublished":"{date}"}}</script>
</head><body><h1>Other heading from the DOM</h1></body></html>"#
    )
}
