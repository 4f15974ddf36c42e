use thiserror::Error;

/// Failure of a single operation against the page capability.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {timeout_ms}ms waiting for {selector}")]
    Timeout { selector: String, timeout_ms: u64 },

    #[error("no element at index {index} matches {selector}")]
    ElementNotFound { selector: String, index: usize },

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("page is closed")]
    Closed,
}

impl PageError {
    /// Returns `true` for failures that may succeed on a second attempt:
    /// a missing element, an expired wait, or a script that raced a re-render.
    ///
    /// Browser-level failures and a closed page are never retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PageError::Timeout { .. } | PageError::ElementNotFound { .. } | PageError::Script(_)
        )
    }
}

/// Failure that ends a whole harvest.
///
/// Per-card failures are not represented here; they are reported as progress
/// events and the loop moves on.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("result feed {selector} was not found: {source}")]
    Discovery {
        selector: String,
        #[source]
        source: PageError,
    },

    #[error("page failed during harvest: {0}")]
    Page(#[from] PageError),
}
