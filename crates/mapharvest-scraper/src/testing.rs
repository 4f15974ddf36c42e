//! Scripted in-memory page for driving the harvest loop without a browser.
//!
//! A [`ScriptedPage`] plays back a sequence of card counts (one per discovery
//! poll, repeating the last value once exhausted) and a per-card script that
//! decides what clicking that card does. Every interaction is recorded so
//! tests can assert on clicks, scrolls and pauses.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::PageError;
use crate::extract::{DetailDocument, Fragment};
use crate::page::{ElementSnapshot, PageCapability, PageLauncher, PageSession};
use crate::settings::Selectors;

/// What happens when a card is clicked.
#[derive(Debug, Clone)]
pub enum ScriptedCard {
    /// The detail panel renders this document.
    Detail(DetailDocument),
    /// The panel renders, but the first `stale_reads` reads see an empty panel.
    SlowDetail {
        document: DetailDocument,
        stale_reads: u32,
    },
    /// The click target cannot be found.
    Missing,
    /// The click succeeds but no detail panel ever appears.
    NoPanel,
    /// The first click fails with a missing element; later clicks render the document.
    FlakyDetail(DetailDocument),
    /// The browser goes away when this card is clicked.
    ClosesPage,
    /// Clicking fails with a browser-level error that is not worth retrying.
    BrowserFailure,
}

impl ScriptedCard {
    /// A business with a name, address and phone number.
    #[must_use]
    pub fn business(name: &str) -> Self {
        Self::Detail(business_document(name))
    }
}

/// Detail document for `name` with a classified address and phone.
#[must_use]
pub fn business_document(name: &str) -> DetailDocument {
    DetailDocument {
        heading: Some(name.to_string()),
        fragments: vec![
            Fragment::new("Copy address", format!("\u{e0c8}\n{name} Street 1")),
            Fragment::new("Copy phone number", "\u{e0b0}\n+971 4 000 0000"),
        ],
    }
}

#[derive(Debug, Default)]
struct Inner {
    counts: VecDeque<usize>,
    last_count: usize,
    cards: Vec<ScriptedCard>,
    feed_present: bool,
    search_label: Option<String>,
    label_hidden_on_click: bool,
    active: Option<usize>,
    stale_reads_left: u32,
    attempts: HashMap<usize, u32>,
    clicks: Vec<usize>,
    scrolls: usize,
    pauses: Vec<Duration>,
    closed: bool,
}

/// In-memory page. Clones share state.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    selectors: Selectors,
    classification_attribute: String,
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedPage {
    /// A page whose feed is present and whose card counts follow `counts`.
    #[must_use]
    pub fn new(counts: impl IntoIterator<Item = usize>, cards: Vec<ScriptedCard>) -> Self {
        let selectors = Selectors::default();
        let classification_attribute = selectors.classification_attribute.clone();
        Self {
            selectors,
            classification_attribute,
            inner: Arc::new(Mutex::new(Inner {
                counts: counts.into_iter().collect(),
                cards,
                feed_present: true,
                ..Inner::default()
            })),
        }
    }

    /// `n` named businesses (`Business 1` ..= `Business n`) with a constant count of `n`.
    #[must_use]
    pub fn with_businesses(n: usize) -> Self {
        let cards = (1..=n)
            .map(|i| ScriptedCard::business(&format!("Business {i}")))
            .collect();
        Self::new([n], cards)
    }

    #[must_use]
    pub fn without_feed(self) -> Self {
        self.state().feed_present = false;
        self
    }

    #[must_use]
    pub fn with_search_label(self, label: &str) -> Self {
        self.state().search_label = Some(label.to_string());
        self
    }

    /// The results label disappears as soon as any card has been clicked, as
    /// it does when the detail pane replaces the results header.
    #[must_use]
    pub fn hides_search_label_on_click(self) -> Self {
        self.state().label_hidden_on_click = true;
        self
    }

    #[must_use]
    pub fn clicks(&self) -> Vec<usize> {
        self.state().clicks.clone()
    }

    #[must_use]
    pub fn scrolls(&self) -> usize {
        self.state().scrolls
    }

    #[must_use]
    pub fn pauses(&self) -> Vec<Duration> {
        self.state().pauses.clone()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_state(&self) -> Result<MutexGuard<'_, Inner>, PageError> {
        let state = self.state();
        if state.closed {
            return Err(PageError::Closed);
        }
        Ok(state)
    }

    fn active_document(state: &Inner) -> Option<DetailDocument> {
        let card = state.cards.get(state.active?)?;
        match card {
            ScriptedCard::Detail(doc) | ScriptedCard::FlakyDetail(doc) => Some(doc.clone()),
            ScriptedCard::SlowDetail { document, .. } => {
                if state.stale_reads_left > 0 {
                    Some(DetailDocument::default())
                } else {
                    Some(document.clone())
                }
            }
            _ => None,
        }
    }
}

#[async_trait]
impl PageCapability for ScriptedPage {
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        let state = self.open_state()?;
        let present = if selector == self.selectors.feed {
            state.feed_present
        } else if selector == self.selectors.detail_panel {
            state.active.is_some()
        } else {
            false
        };
        if present {
            Ok(())
        } else {
            Err(PageError::Timeout {
                selector: selector.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }

    async fn query_all(
        &self,
        selector: &str,
        _attributes: &[&str],
    ) -> Result<Vec<ElementSnapshot>, PageError> {
        let mut state = self.open_state()?;

        if selector == self.selectors.heading {
            let doc = Self::active_document(&state);
            state.stale_reads_left = state.stale_reads_left.saturating_sub(1);
            return Ok(doc
                .and_then(|d| d.heading)
                .map(|text| ElementSnapshot {
                    text,
                    attributes: HashMap::new(),
                })
                .into_iter()
                .collect());
        }

        if selector == self.selectors.fragments {
            let doc = Self::active_document(&state).unwrap_or_default();
            return Ok(doc
                .fragments
                .into_iter()
                .map(|fragment| ElementSnapshot {
                    text: fragment.text,
                    attributes: fragment
                        .classification
                        .map(|c| (self.classification_attribute.clone(), c))
                        .into_iter()
                        .collect(),
                })
                .collect());
        }

        if selector == self.selectors.search_label {
            if state.label_hidden_on_click && !state.clicks.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(state
                .search_label
                .clone()
                .map(|label| ElementSnapshot {
                    text: String::new(),
                    attributes: HashMap::from([("aria-label".to_string(), label)]),
                })
                .into_iter()
                .collect());
        }

        if selector == self.selectors.cards {
            return Ok(vec![ElementSnapshot::default(); state.last_count]);
        }

        Ok(Vec::new())
    }

    async fn count(&self, selector: &str) -> Result<usize, PageError> {
        if selector != self.selectors.cards {
            return Ok(self.query_all(selector, &[]).await?.len());
        }
        let mut state = self.open_state()?;
        if let Some(next) = state.counts.pop_front() {
            state.last_count = next;
        }
        Ok(state.last_count)
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError> {
        let mut state = self.open_state()?;
        state.clicks.push(index);
        let attempt = {
            let attempts = state.attempts.entry(index).or_insert(0);
            *attempts += 1;
            *attempts
        };

        let not_found = || PageError::ElementNotFound {
            selector: selector.to_string(),
            index,
        };

        match state.cards.get(index).cloned() {
            None | Some(ScriptedCard::Missing) => Err(not_found()),
            Some(ScriptedCard::FlakyDetail(_)) if attempt == 1 => Err(not_found()),
            Some(ScriptedCard::BrowserFailure) => {
                Err(PageError::Browser("target crashed".to_string()))
            }
            Some(ScriptedCard::ClosesPage) => {
                state.closed = true;
                Err(PageError::Closed)
            }
            Some(ScriptedCard::NoPanel) => {
                state.active = None;
                Ok(())
            }
            Some(ScriptedCard::SlowDetail { stale_reads, .. }) => {
                state.active = Some(index);
                state.stale_reads_left = stale_reads;
                Ok(())
            }
            Some(ScriptedCard::Detail(_) | ScriptedCard::FlakyDetail(_)) => {
                state.active = Some(index);
                Ok(())
            }
        }
    }

    async fn scroll_to_end(&self, _selector: &str) -> Result<(), PageError> {
        self.open_state()?.scrolls += 1;
        Ok(())
    }

    async fn pause(&self, duration: Duration) {
        self.state().pauses.push(duration);
    }
}

#[async_trait]
impl PageSession for ScriptedPage {
    async fn close(&self) -> Result<(), PageError> {
        self.state().closed = true;
        Ok(())
    }
}

/// Launcher that hands out clones of one scripted page.
#[derive(Debug, Clone)]
pub struct ScriptedLauncher {
    page: ScriptedPage,
    fail_navigation: bool,
    opened: Arc<Mutex<Vec<String>>>,
}

impl ScriptedLauncher {
    #[must_use]
    pub fn new(page: ScriptedPage) -> Self {
        Self {
            page,
            fail_navigation: false,
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A launcher whose every `open` fails with a navigation error.
    #[must_use]
    pub fn failing(page: ScriptedPage) -> Self {
        Self {
            fail_navigation: true,
            ..Self::new(page)
        }
    }

    /// Handle on the shared page, for inspecting recorded interactions.
    #[must_use]
    pub fn page(&self) -> &ScriptedPage {
        &self.page
    }

    #[must_use]
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PageLauncher for ScriptedLauncher {
    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>, PageError> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        if self.fail_navigation {
            return Err(PageError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        Ok(Box::new(self.page.clone()))
    }
}
