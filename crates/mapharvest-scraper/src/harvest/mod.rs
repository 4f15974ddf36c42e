//! The scroll-and-harvest loop.
//!
//! Once the feed is present the results label is read, before anything on the
//! page has been clicked. Each pass then polls the card count, visits every
//! card not yet visited (up to the remaining capacity), and scrolls the feed
//! to trigger loading of more cards. The loop ends when the cap is reached or
//! the card count has not grown for `stall_limit` consecutive polls.

mod state;
mod visit;

use mapharvest_core::{ProgressEvent, ProgressTotal};

use crate::error::{HarvestError, PageError};
use crate::page::PageCapability;
use crate::progress::ProgressReporter;
use crate::search_name::detect_search_name;
use crate::settings::HarvestSettings;

use state::HarvestState;
use visit::CardVisitor;

pub use state::{HarvestReport, StopReason};

/// Runs the harvest loop against an already-navigated results page.
///
/// `cap` bounds the number of accepted records; `None` harvests until the
/// feed stops growing. Per-card failures are reported and skipped.
///
/// # Errors
///
/// - [`HarvestError::Discovery`] if the results feed never appears.
/// - [`HarvestError::Page`] if counting cards or scrolling fails, or the page
///   is closed mid-harvest.
pub async fn harvest<P>(
    page: &P,
    settings: &HarvestSettings,
    cap: Option<usize>,
    reporter: &dyn ProgressReporter,
) -> Result<HarvestReport, HarvestError>
where
    P: PageCapability + ?Sized,
{
    let selectors = &settings.selectors;
    let total = ProgressTotal::from(cap);

    page.pause(settings.initial_load_delay).await;
    page.wait_for(&selectors.feed, settings.feed_timeout)
        .await
        .map_err(|source| HarvestError::Discovery {
            selector: selectors.feed.clone(),
            source,
        })?;

    let mut state = HarvestState::new(cap);
    state.search_name = detect_search_name(page, &selectors.search_label).await;
    tracing::debug!(search_name = %state.search_name, "detected search name");
    let mut visitor = CardVisitor::new(page, settings);

    loop {
        let card_count = page.count(&selectors.cards).await?;
        state.observe(card_count);
        tracing::debug!(
            poll = state.polls,
            card_count,
            stall_streak = state.stall_streak,
            collected = state.results.len(),
            "polled result cards"
        );

        if state.results.is_full() {
            return Ok(finish(state, StopReason::CapReached));
        }
        if state.stall_streak >= settings.stall_limit {
            return Ok(finish(state, StopReason::Stalled));
        }

        let end = state.visit_end(card_count);
        while state.next_card_index < end {
            let index = state.next_card_index;
            state.next_card_index += 1;
            state.cards_visited += 1;

            reporter.report(ProgressEvent::processing(state.results.len() + 1, total, index));

            match visitor.visit(index).await {
                Ok(Some(record)) => {
                    if state.results.push(record.clone()) {
                        reporter.report(ProgressEvent::scraped(state.results.len(), total, record));
                    }
                }
                Ok(None) => {}
                Err(PageError::Closed) => return Err(PageError::Closed.into()),
                Err(err) => {
                    state.cards_failed += 1;
                    tracing::warn!(card = index + 1, error = %err, "card visit failed");
                    reporter.report(ProgressEvent::error(
                        state.results.len(),
                        total,
                        format!("Error processing card {}: {err}", index + 1),
                    ));
                }
            }
        }

        if state.results.is_full() {
            return Ok(finish(state, StopReason::CapReached));
        }

        reporter.report(ProgressEvent::scrolling(state.results.len(), total));
        page.scroll_to_end(&selectors.feed).await?;
        page.pause(settings.scroll_pause).await;
    }
}

fn finish(state: HarvestState, stop: StopReason) -> HarvestReport {
    let report = state.finish(stop);
    tracing::info!(
        records = report.records.len(),
        polls = report.polls,
        cards_visited = report.cards_visited,
        cards_failed = report.cards_failed,
        stop = ?report.stop,
        "harvest finished"
    );
    report
}

#[cfg(test)]
#[path = "harvest_test.rs"]
mod tests;
