use std::time::Duration;

use mapharvest_core::AppConfig;

use crate::extract::FieldMapping;

/// Consecutive no-growth polls after which the result list is considered exhausted.
pub const DEFAULT_STALL_LIMIT: u32 = 3;

/// CSS selectors for the parts of the results page the loop touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    /// Scrollable container holding the result cards.
    pub feed: String,
    /// One element per result card; its count drives discovery.
    pub cards: String,
    /// Clickable element inside each card, indexed in the same order as `cards`.
    pub card_links: String,
    /// Present once a card's detail panel has been rendered.
    pub detail_panel: String,
    /// Business name heading inside the detail panel.
    pub heading: String,
    /// Classified text fragments inside the detail panel.
    pub fragments: String,
    /// Attribute on each fragment naming what the fragment holds.
    pub classification_attribute: String,
    /// Element whose `aria-label` reads `Results for <query>`.
    pub search_label: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            feed: r#"div[role="feed"]"#.to_string(),
            cards: "div.Nv2PK.THOPZb".to_string(),
            card_links: "div.Nv2PK.THOPZb a".to_string(),
            detail_panel: "div.bJzME.Hu9e2e".to_string(),
            heading: "h1.DUwDvf.lfPIob".to_string(),
            fragments: "div.bJzME.Hu9e2e .CsEnBe".to_string(),
            classification_attribute: "data-tooltip".to_string(),
            search_label: r#"div[aria-label*="Results for"]"#.to_string(),
        }
    }
}

/// Everything the harvest loop needs besides the page and the cap.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub selectors: Selectors,
    pub field_mapping: FieldMapping,
    /// Pause before looking for the feed, letting the first cards render.
    pub initial_load_delay: Duration,
    pub feed_timeout: Duration,
    pub detail_timeout: Duration,
    /// Longest time spent waiting for detail content after the panel appears.
    pub settle_budget: Duration,
    /// First settle poll interval; doubles on each unsuccessful poll.
    pub settle_poll_base: Duration,
    pub scroll_pause: Duration,
    /// Extra attempts for a card after a transient failure.
    pub card_retries: u32,
    pub retry_backoff_base: Duration,
    pub stall_limit: u32,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            field_mapping: FieldMapping::default(),
            initial_load_delay: Duration::from_millis(3000),
            feed_timeout: Duration::from_secs(10),
            detail_timeout: Duration::from_secs(10),
            settle_budget: Duration::from_millis(3000),
            settle_poll_base: Duration::from_millis(250),
            scroll_pause: Duration::from_millis(2000),
            card_retries: 0,
            retry_backoff_base: Duration::from_secs(1),
            stall_limit: DEFAULT_STALL_LIMIT,
        }
    }
}

impl HarvestSettings {
    /// Builds settings from application config, keeping default selectors and
    /// field mapping.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            initial_load_delay: Duration::from_millis(config.initial_load_delay_ms),
            feed_timeout: Duration::from_secs(config.feed_timeout_secs),
            detail_timeout: Duration::from_secs(config.detail_timeout_secs),
            settle_budget: Duration::from_millis(config.settle_ms),
            scroll_pause: Duration::from_millis(config.scroll_pause_ms),
            card_retries: config.card_retries,
            ..Self::default()
        }
    }

    /// Settings with every delay set to zero, for tests and dry runs against
    /// in-memory pages.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            initial_load_delay: Duration::ZERO,
            feed_timeout: Duration::ZERO,
            detail_timeout: Duration::ZERO,
            settle_budget: Duration::ZERO,
            settle_poll_base: Duration::ZERO,
            scroll_pause: Duration::ZERO,
            retry_backoff_base: Duration::ZERO,
            ..Self::default()
        }
    }
}
