//! Per-card visit: activate, wait for the detail panel, settle, extract.

use mapharvest_core::BusinessRecord;

use crate::backoff::Backoff;
use crate::error::PageError;
use crate::extract::{extract, DetailDocument};
use crate::page::PageCapability;
use crate::settings::HarvestSettings;

pub(super) struct CardVisitor<'a, P: ?Sized> {
    page: &'a P,
    settings: &'a HarvestSettings,
    /// Heading of the previous successful visit. The detail panel is reused
    /// between cards, so until the heading changes the panel may still show
    /// the previous business.
    last_heading: Option<String>,
}

impl<'a, P> CardVisitor<'a, P>
where
    P: PageCapability + ?Sized,
{
    pub fn new(page: &'a P, settings: &'a HarvestSettings) -> Self {
        Self {
            page,
            settings,
            last_heading: None,
        }
    }

    /// Visits card `index`, retrying transient failures up to
    /// `settings.card_retries` times.
    ///
    /// `Ok(None)` means the panel had no usable name.
    pub async fn visit(&mut self, index: usize) -> Result<Option<BusinessRecord>, PageError> {
        let base = self.settings.retry_backoff_base;
        let backoff = Backoff::new(base, base.saturating_mul(8));
        let mut attempt = 0u32;

        loop {
            match self.visit_once(index).await {
                Ok(record) => return Ok(record),
                Err(err) if err.is_transient() && attempt < self.settings.card_retries => {
                    let delay = backoff.delay(attempt);
                    tracing::debug!(
                        card = index + 1,
                        attempt = attempt + 1,
                        max_retries = self.settings.card_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "card visit failed; retrying after backoff"
                    );
                    self.page.pause(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn visit_once(&mut self, index: usize) -> Result<Option<BusinessRecord>, PageError> {
        let selectors = &self.settings.selectors;

        self.page.click_nth(&selectors.card_links, index).await?;
        self.page
            .wait_for(&selectors.detail_panel, self.settings.detail_timeout)
            .await?;

        let document = self.settle().await?;
        if document.heading.is_some() {
            self.last_heading.clone_from(&document.heading);
        }

        let record = extract(&document, &self.settings.field_mapping).into_record();
        if record.is_none() {
            tracing::debug!(card = index + 1, "detail panel had no business name; skipping");
        }
        Ok(record)
    }

    /// Polls the detail panel until it shows content for a new business or
    /// the settle budget is spent, then returns the last read.
    async fn settle(&self) -> Result<DetailDocument, PageError> {
        let selectors = &self.settings.selectors;
        let backoff = Backoff::new(self.settings.settle_poll_base, self.settings.settle_budget);
        let mut delays = backoff.within(self.settings.settle_budget);

        loop {
            let document = DetailDocument::read(self.page, selectors).await?;
            if self.is_ready(&document) {
                return Ok(document);
            }
            match delays.next() {
                Some(delay) => self.page.pause(delay).await,
                None => {
                    tracing::debug!("settle budget spent; extracting from current panel");
                    return Ok(document);
                }
            }
        }
    }

    fn is_ready(&self, document: &DetailDocument) -> bool {
        document.has_content(&self.settings.field_mapping)
            && document.heading != self.last_heading
    }
}
