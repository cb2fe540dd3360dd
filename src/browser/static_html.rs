//! Selector queries over fetched, non-rendered HTML.
//!
//! [`HtmlPage`] turns any [`DocumentSource`] into a [`PageHandle`]: `goto`
//! fetches and parses the document once with `scraper`, and queries snapshot
//! the matching nodes into [`StaticElement`]s. Scripts never run, so only
//! server-rendered markup is visible.

use super::{ElementHandle, PageHandle};
use crate::error::BrowserError;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

/// A document as returned by a [`DocumentSource`].
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL after redirects; relative hrefs resolve against it.
    pub url: Url,
    pub html: String,
}

/// Something that can turn a URL into HTML.
pub trait DocumentSource {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, BrowserError>;
}

/// A parsed document and the URL it was served from.
struct LoadedDocument {
    url: Url,
    dom: Html,
}

/// A page backed by a [`DocumentSource`].
///
/// `scraper::Html` is neither `Send` nor `Sync`, so neither is the page; the
/// pipeline drives every page from the task that opened it.
pub struct HtmlPage<S> {
    source: Arc<S>,
    document: RwLock<Option<LoadedDocument>>,
}

impl<S: DocumentSource> HtmlPage<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            document: RwLock::new(None),
        }
    }

    async fn select(&self, selector: &str) -> Result<Vec<StaticElement>, BrowserError> {
        let guard = self.document.read().await;
        match guard.as_ref() {
            Some(doc) => select_elements(&doc.dom, selector),
            // blank page before the first navigation
            None => Ok(Vec::new()),
        }
    }
}

impl<S: DocumentSource> PageHandle for HtmlPage<S> {
    type Element = StaticElement;

    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        match tokio::time::timeout(timeout, self.source.fetch(url)).await {
            Ok(Ok(fetched)) => {
                let dom = Html::parse_document(&fetched.html);
                *self.document.write().await = Some(LoadedDocument {
                    url: fetched.url,
                    dom,
                });
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BrowserError::timeout(format!("navigation to {url}"), timeout)),
        }
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> Result<(), BrowserError> {
        // nothing loads after the initial fetch
        Ok(())
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<StaticElement>, BrowserError> {
        Ok(self.select(selector).await?.into_iter().next())
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<StaticElement>, BrowserError> {
        self.select(selector).await
    }

    async fn resolved_hrefs(&self, selector: &str) -> Result<Vec<String>, BrowserError> {
        let guard = self.document.read().await;
        let Some(doc) = guard.as_ref() else {
            return Ok(Vec::new());
        };
        let hrefs = select_elements(&doc.dom, selector)?
            .iter()
            .filter_map(|el| el.attr("href"))
            .filter_map(|href| doc.url.join(href).ok())
            .map(|u| u.to_string())
            .collect();
        Ok(hrefs)
    }

    async fn close(self) -> Result<(), BrowserError> {
        Ok(())
    }
}

/// Snapshot of one matched node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticElement {
    attributes: Vec<(String, String)>,
    text: String,
}

impl StaticElement {
    fn from_ref(el: ElementRef<'_>) -> Self {
        Self {
            attributes: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: el.text().collect(),
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl ElementHandle for StaticElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.attr(name).map(str::to_string))
    }

    async fn text_content(&self) -> Result<Option<String>, BrowserError> {
        Ok(Some(self.text.clone()))
    }
}

/// Snapshot every node of `dom` matching `selector`.
fn select_elements(dom: &Html, selector: &str) -> Result<Vec<StaticElement>, BrowserError> {
    let parsed = Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })?;
    Ok(dom.select(&parsed).map(StaticElement::from_ref).collect())
}
