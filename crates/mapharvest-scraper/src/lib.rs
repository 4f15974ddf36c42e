//! Incremental scroll-and-harvest extraction of business listings from a
//! map-search results feed.
//!
//! The browser is reached only through [`PageCapability`]; the production
//! implementation lives in [`chromium`], tests use [`testing::ScriptedPage`].

pub mod accumulator;
pub mod backoff;
pub mod chromium;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod page;
pub mod progress;
pub mod sanitize;
pub mod search_name;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use accumulator::ResultSet;
pub use chromium::ChromiumLauncher;
pub use error::{HarvestError, PageError};
pub use extract::{extract, DetailDocument, FieldKey, FieldMapping, Fragment, RawFields};
pub use harvest::{harvest, HarvestReport, StopReason};
pub use page::{ElementSnapshot, PageCapability, PageLauncher, PageSession};
pub use progress::{NoopReporter, ProgressReporter};
pub use sanitize::sanitize;
pub use search_name::{detect_search_name, slugify_search_label, DEFAULT_SEARCH_NAME};
pub use settings::{HarvestSettings, Selectors};
