//! Rate Governor
//!
//! Enforces a minimum spacing between calls of the same category. Each
//! caller reserves its slot under the lock and then sleeps outside it, so
//! concurrent waiters get consecutive, non-overlapping slots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::trace;

use crate::clock::Clock;
use crate::config::MinIntervals;
use crate::quota::QuotaCategory;

/// Per-category call spacing
#[derive(Debug)]
pub struct RateGovernor {
    intervals: MinIntervals,
    clock: Arc<dyn Clock>,
    last_slot: Mutex<HashMap<QuotaCategory, Instant>>,
}

impl RateGovernor {
    /// Create a governor
    #[must_use]
    pub fn new(intervals: MinIntervals, clock: Arc<dyn Clock>) -> Self {
        Self {
            intervals,
            clock,
            last_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until `category` may issue its next call. Returns the time waited.
    pub async fn wait_for_slot(&self, category: QuotaCategory) -> Duration {
        let wait = self.reserve(category);
        if !wait.is_zero() {
            trace!(
                category = %category,
                wait_ms = wait.as_millis() as u64,
                "Waiting for call slot"
            );
            self.clock.sleep(wait).await;
        }
        wait
    }

    /// Claim the next slot and return how long until it opens
    fn reserve(&self, category: QuotaCategory) -> Duration {
        let interval = self.intervals.get(category);
        let now = self.clock.now();
        let mut last_slot = self.last_slot.lock().unwrap_or_else(|e| e.into_inner());

        let slot = match last_slot.get(&category) {
            Some(&previous) => (previous + interval).max(now),
            None => now,
        };
        last_slot.insert(category, slot);
        slot.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn governor(millis: u64) -> (RateGovernor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (
            RateGovernor::new(MinIntervals::uniform(millis), clock.clone()),
            clock,
        )
    }

    #[tokio::test]
    async fn test_back_to_back_calls_are_spaced() {
        let (governor, clock) = governor(200);
        let category = QuotaCategory::DriveRequests100s;

        assert_eq!(governor.wait_for_slot(category).await, Duration::ZERO);
        assert_eq!(
            governor.wait_for_slot(category).await,
            Duration::from_millis(200)
        );
        clock.advance(Duration::from_millis(50));
        assert_eq!(
            governor.wait_for_slot(category).await,
            Duration::from_millis(150)
        );
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(200), Duration::from_millis(150)]
        );
    }

    #[tokio::test]
    async fn test_idle_category_does_not_wait() {
        let (governor, clock) = governor(200);
        governor.wait_for_slot(QuotaCategory::DriveQueries100s).await;
        clock.advance(Duration::from_secs(1));
        assert_eq!(
            governor.wait_for_slot(QuotaCategory::DriveQueries100s).await,
            Duration::ZERO
        );
    }

    #[tokio::test]
    async fn test_categories_are_independent() {
        let (governor, _clock) = governor(200);
        governor.wait_for_slot(QuotaCategory::DriveRequests100s).await;
        assert_eq!(
            governor
                .wait_for_slot(QuotaCategory::SheetsRequestsPerMinute)
                .await,
            Duration::ZERO
        );
    }

    #[tokio::test]
    async fn test_concurrent_waiters_get_distinct_slots() {
        let (governor, clock) = governor(200);
        let category = QuotaCategory::DriveRequests100s;

        let waits = futures::future::join_all((0..5).map(|_| governor.wait_for_slot(category))).await;

        assert_eq!(waits.iter().filter(|w| w.is_zero()).count(), 1);
        assert!(clock.elapsed() >= Duration::from_millis(800));
        assert!(clock
            .sleeps()
            .iter()
            .all(|s| *s >= Duration::from_millis(200)));
    }
}
