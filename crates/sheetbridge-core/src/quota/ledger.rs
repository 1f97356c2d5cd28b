//! Quota Ledger
//!
//! Tracks consumption per category and answers admission checks. Windows are
//! refreshed lazily on access; there is no background timer.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::category::{CallOutcome, Decision, OutcomeTallies, QuotaCategory};
use super::status::{CategoryStatus, QuotaStatus};
use crate::clock::Clock;
use crate::config::{Limit, QuotaLimits};
use crate::event_bus::{EventBus, GovernanceEvent};

/// Usage of one category within its current window.
///
/// A windowed category opens its window with the first recorded call and
/// resets once `window_start + window` has passed. The daily budget resets
/// when the local date changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageWindow {
    /// Start of the current window (unset until the first call)
    pub window_start: Option<Instant>,
    /// Calls recorded in the current window
    pub count_in_window: u64,
    /// Units spent today (daily budget only)
    pub cumulative_units_today: u64,
    /// Day the daily counters belong to
    pub day: Option<NaiveDate>,
}

impl UsageWindow {
    /// This window as it looks at `now` / `today`, after any lazy reset
    #[must_use]
    pub fn refreshed(&self, category: QuotaCategory, limit: Limit, now: Instant, today: NaiveDate) -> Self {
        if category.is_daily() {
            return match self.day {
                Some(day) if day == today => *self,
                _ => Self {
                    day: Some(today),
                    ..Self::default()
                },
            };
        }
        match self.window_start {
            Some(start) if now >= start + limit.window() => Self::default(),
            _ => *self,
        }
    }

    /// Usage compared against the ceiling
    #[must_use]
    pub fn usage(&self, category: QuotaCategory) -> u64 {
        if category.is_daily() {
            self.cumulative_units_today
        } else {
            self.count_in_window
        }
    }

    /// Time until this window resets, for a windowed category
    #[must_use]
    pub fn remaining(&self, limit: Limit, now: Instant) -> Duration {
        match self.window_start {
            Some(start) => (start + limit.window()).saturating_duration_since(now),
            None => limit.window(),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    window: UsageWindow,
    tallies: OutcomeTallies,
    warned: bool,
}

struct Warning {
    category: QuotaCategory,
    usage: u64,
    ceiling: u64,
}

/// Process-wide quota ledger.
///
/// `admit` and `record` each take the ledger lock once and never suspend
/// while holding it.
#[derive(Debug)]
pub struct QuotaLedger {
    limits: QuotaLimits,
    warning_ratio: f64,
    clock: Arc<dyn Clock>,
    events: Option<EventBus>,
    slots: Mutex<HashMap<QuotaCategory, Slot>>,
}

impl QuotaLedger {
    /// Create a ledger with the default 90% warning ratio
    #[must_use]
    pub fn new(limits: QuotaLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            warning_ratio: 0.9,
            clock,
            events: None,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Set the usage ratio that marks a category as near its limit
    #[must_use]
    pub fn with_warning_ratio(mut self, ratio: f64) -> Self {
        self.warning_ratio = ratio;
        self
    }

    /// Publish quota warnings on `events`
    #[must_use]
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Configured limits
    #[must_use]
    pub fn limits(&self) -> &QuotaLimits {
        &self.limits
    }

    /// Decide whether a call of `cost` units in `category` may be issued.
    ///
    /// Drive request and query categories are also checked against the
    /// daily unit budget.
    pub fn admit(&self, category: QuotaCategory, cost: u64) -> Decision {
        let now = self.clock.now();
        let today = self.clock.today();
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());

        let decision = self.check(&mut slots, category, cost, now, today);
        let decision = match decision {
            Decision::Allow if category.charges_daily_units() => {
                self.check(&mut slots, QuotaCategory::DriveDailyUnits, cost, now, today)
            }
            other => other,
        };

        if let Decision::Deny {
            category: refused_by,
            retry_after,
        } = decision
        {
            debug!(
                category = %category,
                refused_by = %refused_by,
                cost,
                retry_after_ms = retry_after.as_millis() as u64,
                "Quota admission denied"
            );
        }
        decision
    }

    /// Record an issued call. Quota is spent whether or not it succeeded.
    pub fn record(&self, category: QuotaCategory, cost: u64, outcome: CallOutcome) {
        let now = self.clock.now();
        let today = self.clock.today();
        let mut warnings = Vec::new();

        {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            warnings.extend(self.charge(&mut slots, category, cost, now, today));
            if let Some(slot) = slots.get_mut(&category) {
                slot.tallies.add(outcome);
            }
            if category.charges_daily_units() {
                warnings.extend(self.charge(
                    &mut slots,
                    QuotaCategory::DriveDailyUnits,
                    cost,
                    now,
                    today,
                ));
            }
        }

        for warning in warnings {
            warn!(
                category = %warning.category,
                usage = warning.usage,
                ceiling = warning.ceiling,
                "Quota usage is near its limit"
            );
            if let Some(events) = &self.events {
                events.publish(GovernanceEvent::QuotaWarning {
                    category: warning.category,
                    usage: warning.usage,
                    ceiling: warning.ceiling,
                });
            }
        }
    }

    /// Current usage of `category` (units for the daily budget)
    #[must_use]
    pub fn usage(&self, category: QuotaCategory) -> u64 {
        let now = self.clock.now();
        let today = self.clock.today();
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .get(&category)
            .map(|slot| {
                slot.window
                    .refreshed(category, self.limits.get(category), now, today)
                    .usage(category)
            })
            .unwrap_or(0)
    }

    /// Lifetime outcome counts of `category`
    #[must_use]
    pub fn tallies(&self, category: QuotaCategory) -> OutcomeTallies {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&category)
            .map(|slot| slot.tallies)
            .unwrap_or_default()
    }

    /// Snapshot of every category. Does not modify any window.
    #[must_use]
    pub fn get_status(&self) -> QuotaStatus {
        let now = self.clock.now();
        let today = self.clock.today();
        let until_midnight = self.clock.until_next_day();
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());

        let categories = QuotaCategory::ALL
            .iter()
            .map(|&category| {
                let limit = self.limits.get(category);
                let (window, tallies) = slots
                    .get(&category)
                    .map(|slot| (slot.window, slot.tallies))
                    .unwrap_or_default();
                let window = window.refreshed(category, limit, now, today);
                let usage = window.usage(category);
                let resets_in = if category.is_daily() {
                    Some(until_midnight)
                } else {
                    window
                        .window_start
                        .map(|_| window.remaining(limit, now))
                };

                CategoryStatus {
                    category,
                    usage,
                    ceiling: limit.ceiling,
                    window_secs: limit.window_secs,
                    calls_in_window: window.count_in_window,
                    resets_in_secs: resets_in.map(|d| d.as_secs()),
                    near_limit: self.is_near(usage, limit.ceiling),
                    tallies,
                }
            })
            .collect();

        QuotaStatus { categories }
    }

    fn is_near(&self, usage: u64, ceiling: u64) -> bool {
        ceiling > 0 && usage as f64 >= ceiling as f64 * self.warning_ratio
    }

    fn refresh<'a>(
        &self,
        slots: &'a mut HashMap<QuotaCategory, Slot>,
        category: QuotaCategory,
        now: Instant,
        today: NaiveDate,
    ) -> &'a mut Slot {
        let limit = self.limits.get(category);
        let slot = slots.entry(category).or_default();
        let refreshed = slot.window.refreshed(category, limit, now, today);
        if refreshed != slot.window {
            if slot.window.count_in_window > 0 {
                debug!(category = %category, "Quota window reset");
            }
            slot.window = refreshed;
            slot.warned = false;
        }
        slot
    }

    fn check(
        &self,
        slots: &mut HashMap<QuotaCategory, Slot>,
        category: QuotaCategory,
        cost: u64,
        now: Instant,
        today: NaiveDate,
    ) -> Decision {
        let limit = self.limits.get(category);
        let window = self.refresh(slots, category, now, today).window;

        if category.is_daily() {
            if window.cumulative_units_today.saturating_add(cost) > limit.ceiling {
                return Decision::Deny {
                    category,
                    retry_after: self.clock.until_next_day(),
                };
            }
        } else if window.count_in_window + 1 > limit.ceiling {
            return Decision::Deny {
                category,
                retry_after: window.remaining(limit, now),
            };
        }
        Decision::Allow
    }

    fn charge(
        &self,
        slots: &mut HashMap<QuotaCategory, Slot>,
        category: QuotaCategory,
        cost: u64,
        now: Instant,
        today: NaiveDate,
    ) -> Option<Warning> {
        let ceiling = self.limits.get(category).ceiling;
        let slot = self.refresh(slots, category, now, today);

        if !category.is_daily() && slot.window.window_start.is_none() {
            slot.window.window_start = Some(now);
        }
        slot.window.count_in_window += 1;
        if category.is_daily() {
            slot.window.cumulative_units_today =
                slot.window.cumulative_units_today.saturating_add(cost);
        }

        let usage = slot.window.usage(category);
        if !slot.warned && self.is_near(usage, ceiling) {
            slot.warned = true;
            return Some(Warning {
                category,
                usage,
                ceiling,
            });
        }
        None
    }
}
