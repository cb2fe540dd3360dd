//! Browser capability boundary.
//!
//! The harvesting pipeline only talks to these traits. An engine provides
//! isolated browsing contexts, a context hands out pages, and a page can be
//! navigated and queried with CSS selectors. Two engines ship with the crate:
//!
//! | Engine | Module | Renders JS | Notes |
//! |--------|--------|------------|-------|
//! | Chromium | [`chromium`] | yes | headless Chrome over CDP via `chromiumoxide` |
//! | HTTP | [`http`] | no | `reqwest` fetch + `scraper` DOM queries |
//!
//! Ownership follows the pipeline: one context per site, one page per
//! in-flight operation. A page is never shared between two tasks.

pub mod chromium;
pub mod http;
pub mod static_html;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::error::BrowserError;
use std::time::Duration;

/// A running engine able to create isolated browsing contexts.
pub trait BrowserEngine {
    type Context: BrowsingContext;

    /// Open a fresh context with its own cookie and storage sandbox.
    async fn new_context(&self) -> Result<Self::Context, BrowserError>;
}

/// An isolated cookie/storage sandbox holding any number of pages.
pub trait BrowsingContext {
    type Page: PageHandle;

    async fn new_page(&self) -> Result<Self::Page, BrowserError>;

    /// Close the context, releasing every page still open in it.
    async fn close(self) -> Result<(), BrowserError>;
}

/// One tab.
pub trait PageHandle {
    type Element: ElementHandle;

    /// Navigate and wait for minimal document readiness.
    ///
    /// Fails with [`BrowserError::Timeout`] when `timeout` elapses first.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Wait for network quiescence, up to `timeout`.
    ///
    /// Callers treat this as a soft wait and ignore its error.
    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), BrowserError>;

    /// First element matching `selector`, if any.
    async fn query_selector(&self, selector: &str) -> Result<Option<Self::Element>, BrowserError>;

    /// Every element matching `selector`, in document order.
    async fn query_selector_all(&self, selector: &str) -> Result<Vec<Self::Element>, BrowserError>;

    /// Absolute `href` of every element matching `selector`, resolved by the
    /// page against its own URL.
    async fn resolved_hrefs(&self, selector: &str) -> Result<Vec<String>, BrowserError>;

    async fn close(self) -> Result<(), BrowserError>;
}

/// A node returned by a selector query.
pub trait ElementHandle {
    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError>;

    /// Concatenated text of the node and its descendants.
    async fn text_content(&self) -> Result<Option<String>, BrowserError>;
}
