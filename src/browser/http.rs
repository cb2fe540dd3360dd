//! Script-free engine: plain HTTP fetches queried with `scraper`.
//!
//! Useful for server-rendered sites and for machines without Chrome. Each
//! context gets its own `reqwest::Client`, so connection pools are not shared
//! between sites.

use super::static_html::{DocumentSource, FetchedDocument, HtmlPage};
use super::{BrowserEngine, BrowsingContext};
use crate::error::BrowserError;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, instrument};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct HttpEngine {
    user_agent: String,
}

impl Default for HttpEngine {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpEngine {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl BrowserEngine for HttpEngine {
    type Context = HttpContext;

    async fn new_context(&self) -> Result<HttpContext, BrowserError> {
        let client = Client::builder()
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        Ok(HttpContext {
            fetcher: Arc::new(HttpFetcher { client }),
        })
    }
}

pub struct HttpContext {
    fetcher: Arc<HttpFetcher>,
}

impl BrowsingContext for HttpContext {
    type Page = HtmlPage<HttpFetcher>;

    async fn new_page(&self) -> Result<Self::Page, BrowserError> {
        Ok(HtmlPage::new(Arc::clone(&self.fetcher)))
    }

    async fn close(self) -> Result<(), BrowserError> {
        Ok(())
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl DocumentSource for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, BrowserError> {
        let navigation = |e: reqwest::Error| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(navigation)?;
        let final_url = response.url().clone();
        let html = response.text().await.map_err(navigation)?;

        debug!(%final_url, bytes = html.len(), "Fetched document");
        Ok(FetchedDocument { url: final_url, html })
    }
}
