//! The browser as seen by the harvest loop.
//!
//! Everything the loop needs from a rendered page is expressed as a handful of
//! selector-based operations so the loop can run against a real browser
//! ([`crate::chromium`]) or a scripted fake.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::PageError;

/// Text and selected attributes of one element, captured at query time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ElementSnapshot {
    /// Trimmed `textContent` of the element's subtree.
    pub text: String,
    /// Only the attributes requested in the query, and only those present.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl ElementSnapshot {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[async_trait]
pub trait PageCapability: Send + Sync {
    /// Resolves once at least one element matches `selector`.
    ///
    /// # Errors
    ///
    /// [`PageError::Timeout`] if nothing matched within `timeout`.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), PageError>;

    /// Snapshots every element matching `selector`, in document order, with
    /// the listed `attributes`.
    async fn query_all(
        &self,
        selector: &str,
        attributes: &[&str],
    ) -> Result<Vec<ElementSnapshot>, PageError>;

    /// Number of elements currently matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, PageError> {
        Ok(self.query_all(selector, &[]).await?.len())
    }

    /// Activates the `index`-th element matching `selector`.
    ///
    /// # Errors
    ///
    /// [`PageError::ElementNotFound`] if fewer than `index + 1` elements match.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError>;

    /// Scrolls the first element matching `selector` to its maximum extent.
    async fn scroll_to_end(&self, selector: &str) -> Result<(), PageError>;

    async fn pause(&self, duration: Duration);
}

/// A page that owns browser resources and must be closed when done.
#[async_trait]
pub trait PageSession: PageCapability {
    /// Releases the page and its browser. Later operations fail with
    /// [`PageError::Closed`].
    async fn close(&self) -> Result<(), PageError>;
}

/// Opens a fresh, independently owned page on a URL.
#[async_trait]
pub trait PageLauncher: Send + Sync {
    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>, PageError>;
}
