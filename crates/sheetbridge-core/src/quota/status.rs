//! Ledger status snapshots

use serde::Serialize;

use super::category::{OutcomeTallies, QuotaCategory};

/// Snapshot of one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStatus {
    /// Category
    pub category: QuotaCategory,
    /// Calls in the window, or units spent today for the daily budget
    pub usage: u64,
    /// Configured ceiling
    pub ceiling: u64,
    /// Configured window length
    pub window_secs: u64,
    /// Calls recorded in the current window
    pub calls_in_window: u64,
    /// Seconds until the window resets (unset while the window is empty)
    pub resets_in_secs: Option<u64>,
    /// Usage has reached the warning ratio
    pub near_limit: bool,
    /// Lifetime outcome counts
    pub tallies: OutcomeTallies,
}

impl CategoryStatus {
    /// Fraction of the ceiling in use
    #[must_use]
    pub fn usage_ratio(&self) -> f64 {
        if self.ceiling == 0 {
            return 0.0;
        }
        self.usage as f64 / self.ceiling as f64
    }
}

/// Snapshot of every category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaStatus {
    /// One entry per category
    pub categories: Vec<CategoryStatus>,
}

impl QuotaStatus {
    /// Status of `category`
    #[must_use]
    pub fn get(&self, category: QuotaCategory) -> Option<&CategoryStatus> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Categories at or above the warning ratio
    #[must_use]
    pub fn near_limit(&self) -> Vec<QuotaCategory> {
        self.categories
            .iter()
            .filter(|c| c.near_limit)
            .map(|c| c.category)
            .collect()
    }
}
