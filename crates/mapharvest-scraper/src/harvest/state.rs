use mapharvest_core::BusinessRecord;

use crate::accumulator::ResultSet;
use crate::search_name::DEFAULT_SEARCH_NAME;

/// Why a harvest stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cap was reached.
    CapReached,
    /// The card count stopped growing for `stall_limit` consecutive polls.
    Stalled,
}

/// Finished harvest: records in visit order plus loop diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub records: Vec<BusinessRecord>,
    /// Slug of the results label, read before any card was visited.
    pub search_name: String,
    pub stop: StopReason,
    /// Discovery polls performed, including the one that ended the loop.
    pub polls: usize,
    /// Card visits attempted (retries of the same card count once).
    pub cards_visited: usize,
    /// Cards whose visit failed after all retries.
    pub cards_failed: usize,
}

/// Mutable loop state, owned by a single harvest.
#[derive(Debug)]
pub(super) struct HarvestState {
    pub results: ResultSet,
    pub last_observed_card_count: usize,
    pub stall_streak: u32,
    /// Next card ordinal to visit. Advances past failed and nameless cards so
    /// no card is visited twice.
    pub next_card_index: usize,
    pub polls: usize,
    pub cards_visited: usize,
    pub cards_failed: usize,
    pub search_name: String,
}

impl HarvestState {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            results: ResultSet::new(cap),
            last_observed_card_count: 0,
            stall_streak: 0,
            next_card_index: 0,
            polls: 0,
            cards_visited: 0,
            cards_failed: 0,
            search_name: DEFAULT_SEARCH_NAME.to_string(),
        }
    }

    /// Records a discovery poll that saw `card_count` cards and updates the
    /// stall streak.
    pub fn observe(&mut self, card_count: usize) {
        self.polls += 1;
        if card_count == self.last_observed_card_count {
            self.stall_streak += 1;
        } else {
            self.stall_streak = 0;
            self.last_observed_card_count = card_count;
        }
    }

    /// Exclusive end of the card range to visit in this pass.
    pub fn visit_end(&self, card_count: usize) -> usize {
        match self.results.remaining_capacity() {
            Some(remaining) => card_count.min(self.next_card_index.saturating_add(remaining)),
            None => card_count,
        }
    }

    pub fn finish(self, stop: StopReason) -> HarvestReport {
        HarvestReport {
            records: self.results.into_records(),
            search_name: self.search_name,
            stop,
            polls: self.polls,
            cards_visited: self.cards_visited,
            cards_failed: self.cards_failed,
        }
    }
}
