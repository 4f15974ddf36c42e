//! Progress notifications emitted by the harvest loop.
//!
//! Events are fire-and-forget: the loop never reads them back and a missing
//! listener is not an error. The serialized shape is what the service sends
//! on its `scraping-progress` channel:
//!
//! ```json
//! { "status": "scraped", "current": 3, "total": 10, "message": "Scraped: Foo", "data": { ... } }
//! ```

use serde::{Serialize, Serializer};

use crate::BusinessRecord;

/// Upper bound reported alongside `current`: the cap, or `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTotal {
    Capped(usize),
    Unlimited,
}

impl From<Option<usize>> for ProgressTotal {
    fn from(cap: Option<usize>) -> Self {
        cap.map_or(Self::Unlimited, Self::Capped)
    }
}

impl std::fmt::Display for ProgressTotal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Capped(n) => write!(f, "{n}"),
            Self::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl Serialize for ProgressTotal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Capped(n) => serializer.serialize_u64(*n as u64),
            Self::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressKind {
    /// A card is about to be visited.
    Processing,
    /// A record was accepted into the result set.
    Scraped { data: BusinessRecord },
    /// A single card visit failed; the harvest continues.
    Error,
    /// The result list is being scrolled to load more cards.
    Scrolling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    #[serde(flatten)]
    pub kind: ProgressKind,
    pub current: usize,
    pub total: ProgressTotal,
    pub message: String,
}

impl ProgressEvent {
    #[must_use]
    pub fn processing(current: usize, total: ProgressTotal, card_index: usize) -> Self {
        Self {
            kind: ProgressKind::Processing,
            current,
            total,
            message: format!("Processing card {}...", card_index + 1),
        }
    }

    #[must_use]
    pub fn scraped(current: usize, total: ProgressTotal, record: BusinessRecord) -> Self {
        Self {
            message: format!("Scraped: {}", record.name),
            kind: ProgressKind::Scraped { data: record },
            current,
            total,
        }
    }

    #[must_use]
    pub fn error(current: usize, total: ProgressTotal, message: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Error,
            current,
            total,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn scrolling(current: usize, total: ProgressTotal) -> Self {
        Self {
            kind: ProgressKind::Scrolling,
            current,
            total,
            message: "Loading more results...".to_string(),
        }
    }
}
