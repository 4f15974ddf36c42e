//! Exponential backoff schedule shared by card retries and settle polling.
//!
//! Sleeping is left to the caller (through [`crate::PageCapability::pause`]) so
//! the schedule itself stays a pure function of the attempt number.

use std::time::Duration;

/// `base * 2^attempt`, clamped to `ceiling`.
///
/// # Schedule (example with `base = 250ms`, `ceiling = 1s`)
///
/// | Attempt | Delay |
/// |---------|-------|
/// | 0 | 250 ms |
/// | 1 | 500 ms |
/// | 2 | 1 s |
/// | 3 | 1 s |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    ceiling: Duration,
}

impl Backoff {
    #[must_use]
    pub fn new(base: Duration, ceiling: Duration) -> Self {
        Self { base, ceiling }
    }

    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        // Cap the shift to prevent overflow on extreme attempt counts.
        let factor = 1u32 << attempt.min(31);
        self.base.saturating_mul(factor).min(self.ceiling)
    }

    /// Successive delays whose sum is exactly `budget`; the final delay is
    /// shortened so the total never exceeds it. Empty for a zero budget.
    pub fn within(self, budget: Duration) -> impl Iterator<Item = Duration> {
        let mut spent = Duration::ZERO;
        let mut attempt = 0u32;
        std::iter::from_fn(move || {
            let remaining = budget.saturating_sub(spent);
            if remaining.is_zero() {
                return None;
            }
            // A zero base would never exhaust the budget.
            let step = self.delay(attempt).max(Duration::from_millis(1)).min(remaining);
            spent += step;
            attempt = attempt.saturating_add(1);
            Some(step)
        })
    }
}
