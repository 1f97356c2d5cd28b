//! Governance and conversion configuration
//!
//! Every struct deserializes with serde defaults, so a config file only needs
//! the keys it overrides.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::quota::QuotaCategory;
use crate::retry::RetryConfig;

/// Ceiling and window of one quota category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    /// Maximum calls (or units, for the daily budget) per window
    pub ceiling: u64,
    /// Window length in seconds (the daily budget resets at local midnight)
    pub window_secs: u64,
}

impl Limit {
    /// Create a limit
    #[must_use]
    pub const fn new(ceiling: u64, window_secs: u64) -> Self {
        Self {
            ceiling,
            window_secs,
        }
    }

    /// Window length
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Limits for every quota category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaLimits {
    /// Drive API requests per 100 seconds
    pub drive_requests_100s: Limit,
    /// Drive API units per day
    pub drive_daily_units: Limit,
    /// Sheets API requests per minute
    pub sheets_requests_per_minute: Limit,
    /// Drive list queries per 100 seconds
    pub drive_queries_100s: Limit,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            drive_requests_100s: Limit::new(1_000, 100),
            drive_daily_units: Limit::new(1_000_000_000, 86_400),
            sheets_requests_per_minute: Limit::new(300, 60),
            drive_queries_100s: Limit::new(20_000, 100),
        }
    }
}

impl QuotaLimits {
    /// Limit for `category`
    #[must_use]
    pub fn get(&self, category: QuotaCategory) -> Limit {
        match category {
            QuotaCategory::DriveRequests100s => self.drive_requests_100s,
            QuotaCategory::DriveDailyUnits => self.drive_daily_units,
            QuotaCategory::SheetsRequestsPerMinute => self.sheets_requests_per_minute,
            QuotaCategory::DriveQueries100s => self.drive_queries_100s,
        }
    }

    /// Replace the limit for `category`
    #[must_use]
    pub fn with_limit(mut self, category: QuotaCategory, limit: Limit) -> Self {
        match category {
            QuotaCategory::DriveRequests100s => self.drive_requests_100s = limit,
            QuotaCategory::DriveDailyUnits => self.drive_daily_units = limit,
            QuotaCategory::SheetsRequestsPerMinute => self.sheets_requests_per_minute = limit,
            QuotaCategory::DriveQueries100s => self.drive_queries_100s = limit,
        }
        self
    }
}

/// Minimum spacing between calls, per category, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinIntervals {
    /// Drive requests
    pub drive_requests_100s: u64,
    /// Daily unit budget (only used when called directly)
    pub drive_daily_units: u64,
    /// Sheets requests
    pub sheets_requests_per_minute: u64,
    /// Drive queries
    pub drive_queries_100s: u64,
}

impl Default for MinIntervals {
    fn default() -> Self {
        Self::uniform(200)
    }
}

impl MinIntervals {
    /// Same spacing for every category
    #[must_use]
    pub const fn uniform(millis: u64) -> Self {
        Self {
            drive_requests_100s: millis,
            drive_daily_units: millis,
            sheets_requests_per_minute: millis,
            drive_queries_100s: millis,
        }
    }

    /// Spacing for `category`
    #[must_use]
    pub fn get(&self, category: QuotaCategory) -> Duration {
        let millis = match category {
            QuotaCategory::DriveRequests100s => self.drive_requests_100s,
            QuotaCategory::DriveDailyUnits => self.drive_daily_units,
            QuotaCategory::SheetsRequestsPerMinute => self.sheets_requests_per_minute,
            QuotaCategory::DriveQueries100s => self.drive_queries_100s,
        };
        Duration::from_millis(millis)
    }
}

/// Daily units charged per remote operation type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationCosts {
    /// Metadata reads and downloads
    pub read: u64,
    /// List queries
    pub query: u64,
    /// Metadata writes
    pub write: u64,
    /// Uploads
    pub create: u64,
    /// Copies
    pub copy: u64,
    /// Format conversions
    pub convert: u64,
    /// Deletes
    pub delete: u64,
}

impl Default for OperationCosts {
    fn default() -> Self {
        Self {
            read: 1,
            query: 1,
            write: 10,
            create: 100,
            copy: 100,
            convert: 200,
            delete: 100,
        }
    }
}

/// Settings for the ledger, governor and resilient caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Quota ceilings
    pub limits: QuotaLimits,
    /// Minimum call spacing
    pub min_interval_ms: MinIntervals,
    /// Backoff policy
    pub retry: RetryConfig,
    /// Longest single wait after a ledger denial
    pub max_quota_wait_secs: u64,
    /// Usage ratio at which a category is reported as near its limit
    pub warning_ratio: f64,
    /// Publish a progress event every this many calls per category
    pub progress_every: u64,
    /// Unit costs per operation
    pub costs: OperationCosts,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            limits: QuotaLimits::default(),
            min_interval_ms: MinIntervals::default(),
            retry: RetryConfig::default(),
            max_quota_wait_secs: 60,
            warning_ratio: 0.9,
            progress_every: 10,
            costs: OperationCosts::default(),
        }
    }
}

impl GovernanceConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quota limits
    #[must_use]
    pub fn with_limits(mut self, limits: QuotaLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the minimum call spacing
    #[must_use]
    pub fn with_min_intervals(mut self, intervals: MinIntervals) -> Self {
        self.min_interval_ms = intervals;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the longest single wait after a ledger denial
    #[must_use]
    pub fn with_max_quota_wait(mut self, wait: Duration) -> Self {
        self.max_quota_wait_secs = wait.as_secs();
        self
    }

    /// Set the progress event interval
    #[must_use]
    pub fn with_progress_every(mut self, calls: u64) -> Self {
        self.progress_every = calls;
        self
    }

    /// Set the operation costs
    #[must_use]
    pub fn with_costs(mut self, costs: OperationCosts) -> Self {
        self.costs = costs;
        self
    }

    /// Longest single wait after a ledger denial
    #[must_use]
    pub fn max_quota_wait(&self) -> Duration {
        Duration::from_secs(self.max_quota_wait_secs)
    }

    /// Reject values the governance layer cannot work with
    pub fn validate(&self) -> Result<()> {
        for category in QuotaCategory::ALL {
            let limit = self.limits.get(category);
            if limit.ceiling == 0 {
                return Err(Error::InvalidConfig {
                    field: format!("limits.{}.ceiling", category.as_str()),
                    message: "ceiling must be greater than zero".to_string(),
                });
            }
            if limit.window_secs == 0 {
                return Err(Error::InvalidConfig {
                    field: format!("limits.{}.window_secs", category.as_str()),
                    message: "window must be at least one second".to_string(),
                });
            }
        }
        if !(self.warning_ratio > 0.0 && self.warning_ratio <= 1.0) {
            return Err(Error::InvalidConfig {
                field: "warning_ratio".to_string(),
                message: format!("{} is outside (0, 1]", self.warning_ratio),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidConfig {
                field: "retry.max_attempts".to_string(),
                message: "at least one attempt is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Conversion behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Sources larger than this go to the enhanced tier on any standard failure
    pub size_threshold_bytes: u64,
    /// Leave intermediate artifacts in place
    pub keep_intermediates: bool,
    /// Delete the source after a successful conversion
    pub remove_source: bool,
    /// Reuse an existing converted spreadsheet with the same base name
    pub reuse_existing: bool,
    /// Suffix of the cleaned staging upload
    pub processed_suffix: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            size_threshold_bytes: 10 * 1024 * 1024,
            keep_intermediates: false,
            remove_source: false,
            reuse_existing: false,
            processed_suffix: "_processed".to_string(),
        }
    }
}

impl ConversionConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep intermediate artifacts
    #[must_use]
    pub fn with_keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    /// Delete the source after success
    #[must_use]
    pub fn with_remove_source(mut self, remove: bool) -> Self {
        self.remove_source = remove;
        self
    }

    /// Reuse existing conversions
    #[must_use]
    pub fn with_reuse_existing(mut self, reuse: bool) -> Self {
        self.reuse_existing = reuse;
        self
    }

    /// Set the size threshold
    #[must_use]
    pub fn with_size_threshold(mut self, bytes: u64) -> Self {
        self.size_threshold_bytes = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GovernanceConfig::default();
        assert_eq!(
            config.limits.get(QuotaCategory::DriveRequests100s),
            Limit::new(1_000, 100)
        );
        assert_eq!(
            config.limits.get(QuotaCategory::SheetsRequestsPerMinute),
            Limit::new(300, 60)
        );
        assert_eq!(
            config.min_interval_ms.get(QuotaCategory::DriveQueries100s),
            Duration::from_millis(200)
        );
        assert_eq!(config.max_quota_wait(), Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.validate().is_ok());

        let conversion = ConversionConfig::default();
        assert_eq!(conversion.size_threshold_bytes, 10_485_760);
        assert_eq!(conversion.processed_suffix, "_processed");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: GovernanceConfig = serde_json::from_value(serde_json::json!({
            "limits": { "drive_requests_100s": { "ceiling": 3, "window_secs": 100 } },
            "retry": { "max_attempts": 2 },
            "costs": { "convert": 50 }
        }))
        .unwrap();

        assert_eq!(config.limits.drive_requests_100s.ceiling, 3);
        assert_eq!(config.limits.sheets_requests_per_minute.ceiling, 300);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.costs.convert, 50);
        assert_eq!(config.costs.copy, 100);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_ceiling = GovernanceConfig::default().with_limits(
            QuotaLimits::default().with_limit(QuotaCategory::DriveQueries100s, Limit::new(0, 100)),
        );
        match zero_ceiling.validate() {
            Err(Error::InvalidConfig { field, .. }) => {
                assert_eq!(field, "limits.drive_queries_100s.ceiling");
            }
            other => panic!("unexpected: {other:?}"),
        }

        let bad_ratio = GovernanceConfig {
            warning_ratio: 1.5,
            ..GovernanceConfig::default()
        };
        assert!(bad_ratio.validate().is_err());

        let no_attempts =
            GovernanceConfig::default().with_retry(RetryConfig::new().with_max_attempts(0));
        assert!(no_attempts.validate().is_err());
    }
}
