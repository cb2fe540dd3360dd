//! Chromium engine using chromiumoxide.
//!
//! One headless Chrome process serves the whole run. Every
//! [`BrowsingContext`] is a CDP browser context, so cookies and storage from
//! one site never leak into the next.

use super::{BrowserEngine, BrowsingContext, ElementHandle, PageHandle};
use crate::error::BrowserError;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::page::EventDomContentEventFired;
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Budget for a single CDP round trip unless the settings say otherwise.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval between resource-count samples while waiting for quiescence.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Consecutive unchanged samples that count as idle.
const IDLE_STABLE_SAMPLES: u32 = 2;

/// Launch options for [`ChromiumEngine`].
#[derive(Debug, Clone)]
pub struct ChromiumSettings {
    /// Chrome binary; auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    /// CDP request budget. chromiumoxide also applies it to the `load`
    /// wait behind every navigation, so it should be at least the
    /// configured navigation timeout.
    pub request_timeout: Duration,
}

impl Default for ChromiumSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct ChromiumEngine {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
    request_timeout: Duration,
}

impl ChromiumEngine {
    /// Start Chrome and spawn the CDP event handler.
    #[instrument(level = "info")]
    pub async fn launch(settings: &ChromiumSettings) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .request_timeout(settings.request_timeout);
        if let Some(path) = &settings.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        info!("Chromium launched");
        Ok(Self {
            browser: Arc::new(browser),
            handler,
            request_timeout: settings.request_timeout,
        })
    }

    /// Close Chrome and stop the handler task.
    ///
    /// Contexts still holding the browser keep it alive; in that case the
    /// process is killed when the last handle drops.
    pub async fn shutdown(self) {
        match Arc::try_unwrap(self.browser) {
            Ok(mut browser) => {
                if let Err(e) = browser.close().await {
                    warn!(error = %e, "Failed to close Chromium cleanly");
                }
                let _ = browser.wait().await;
            }
            Err(_) => warn!("Chromium still referenced at shutdown"),
        }
        self.handler.abort();
        info!("Chromium shut down");
    }
}

impl BrowserEngine for ChromiumEngine {
    type Context = ChromiumContext;

    async fn new_context(&self) -> Result<ChromiumContext, BrowserError> {
        let id = self
            .browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(|e| protocol_error(e, self.request_timeout))?;
        Ok(ChromiumContext {
            browser: Arc::clone(&self.browser),
            id,
            request_timeout: self.request_timeout,
        })
    }
}

pub struct ChromiumContext {
    browser: Arc<Browser>,
    id: BrowserContextId,
    request_timeout: Duration,
}

impl BrowsingContext for ChromiumContext {
    type Page = ChromiumPage;

    async fn new_page(&self) -> Result<ChromiumPage, BrowserError> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(self.id.clone())
            .build()
            .map_err(BrowserError::Protocol)?;
        let page = self
            .browser
            .new_page(params)
            .await
            .map_err(|e| protocol_error(e, self.request_timeout))?;
        Ok(ChromiumPage {
            page,
            request_timeout: self.request_timeout,
        })
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.browser
            .dispose_browser_context(self.id.clone())
            .await
            .map_err(|e| protocol_error(e, self.request_timeout))
    }
}

pub struct ChromiumPage {
    page: Page,
    request_timeout: Duration,
}

impl ChromiumPage {
    async fn resource_count(&self) -> Result<u64, BrowserError> {
        self.page
            .evaluate("performance.getEntriesByType('resource').length")
            .await
            .map_err(|e| script_error(e, self.request_timeout))?
            .into_value::<u64>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }
}

impl PageHandle for ChromiumPage {
    type Element = ChromiumElement;

    /// Returns at `DOMContentLoaded`; the `load` event chromiumoxide waits
    /// for is not required.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        let mut dom_ready = self
            .page
            .event_listener::<EventDomContentEventFired>()
            .await
            .map_err(|e| protocol_error(e, self.request_timeout))?;

        let navigation = async {
            tokio::select! {
                loaded = self.page.goto(url) => loaded.map(|_| ()),
                Some(_) = dom_ready.next() => Ok(()),
            }
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(CdpError::Timeout)) | Err(_) => {
                Err(BrowserError::timeout(format!("navigation to {url}"), timeout))
            }
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), BrowserError> {
        let settle = async {
            let mut last = self.resource_count().await?;
            let mut stable = 0;
            while stable < IDLE_STABLE_SAMPLES {
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                let now = self.resource_count().await?;
                if now == last {
                    stable += 1;
                } else {
                    stable = 0;
                    last = now;
                }
            }
            Ok::<(), BrowserError>(())
        };
        tokio::time::timeout(timeout, settle)
            .await
            .map_err(|_| BrowserError::timeout("network idle", timeout))?
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<ChromiumElement>, BrowserError> {
        Ok(self.query_selector_all(selector).await?.into_iter().next())
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ChromiumElement>, BrowserError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| query_error(selector, e, self.request_timeout))?;
        Ok(elements
            .into_iter()
            .map(|element| ChromiumElement {
                element,
                request_timeout: self.request_timeout,
            })
            .collect())
    }

    async fn resolved_hrefs(&self, selector: &str) -> Result<Vec<String>, BrowserError> {
        let quoted = serde_json::to_string(selector).map_err(|e| BrowserError::Script(e.to_string()))?;
        let script = format!(
            "Array.from(document.querySelectorAll({quoted})).map(e => e.href).filter(h => typeof h === 'string' && h.length > 0)"
        );
        self.page
            .evaluate(script)
            .await
            .map_err(|e| query_error(selector, e, self.request_timeout))?
            .into_value::<Vec<String>>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.page
            .close()
            .await
            .map_err(|e| protocol_error(e, self.request_timeout))
    }
}

pub struct ChromiumElement {
    element: Element,
    request_timeout: Duration,
}

impl ElementHandle for ChromiumElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| element_error(e, self.request_timeout))
    }

    async fn text_content(&self) -> Result<Option<String>, BrowserError> {
        let returns = self
            .element
            .call_js_fn("function() { return this.textContent; }", false)
            .await
            .map_err(|e| element_error(e, self.request_timeout))?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_str().map(str::to_string)))
    }
}

fn protocol_error(e: CdpError, budget: Duration) -> BrowserError {
    match e {
        CdpError::Timeout => BrowserError::timeout("browser request", budget),
        CdpError::NoResponse => BrowserError::ContextClosed,
        other => BrowserError::Protocol(other.to_string()),
    }
}

fn script_error(e: CdpError, budget: Duration) -> BrowserError {
    match e {
        CdpError::Timeout => BrowserError::timeout("script evaluation", budget),
        CdpError::JavascriptException(details) => BrowserError::Script(format!("{details:?}")),
        other => protocol_error(other, budget),
    }
}

/// The engine answers a rejected selector with a protocol-level error.
fn query_error(selector: &str, e: CdpError, budget: Duration) -> BrowserError {
    match e {
        CdpError::Chrome(reason) => BrowserError::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        },
        CdpError::NotFound => BrowserError::NotFound(selector.to_string()),
        other => script_error(other, budget),
    }
}

/// Reads on a node fail with a protocol error once it has been detached.
fn element_error(e: CdpError, budget: Duration) -> BrowserError {
    match e {
        CdpError::Chrome(reason) => BrowserError::NotFound(reason.to_string()),
        CdpError::NotFound => BrowserError::NotFound("node".to_string()),
        other => script_error(other, budget),
    }
}
