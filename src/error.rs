//! Error taxonomy for the browser capability boundary.
//!
//! Every engine maps its native failures into [`BrowserError`]. The harvesting
//! pipeline never inspects engine-specific errors; it only asks
//! [`BrowserError::is_recoverable`] to decide whether to move on to the next
//! selector or fallback tier, or to give up on the current item.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    /// The engine process could not be started. Fatal for the whole run.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// Navigation was rejected by the engine (DNS failure, bad status, ...).
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A navigation or wait did not settle within its budget.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    /// The queried node vanished between lookup and read.
    #[error("element not found: {0}")]
    NotFound(String),

    /// The engine refused the selector string.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// An in-page evaluation failed or returned an unexpected shape.
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// Transport or protocol level failure talking to the engine.
    #[error("browser protocol error: {0}")]
    Protocol(String),

    /// The page or context was used after it had been closed.
    #[error("page or context already closed")]
    ContextClosed,
}

impl BrowserError {
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout,
        }
    }

    /// Whether the caller may fall through to its next selector or tier.
    ///
    /// Anything else means the page itself is unusable and the item fails.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::NotFound(_) | Self::InvalidSelector { .. } | Self::Script(_)
        )
    }
}
