//! Quota categories, admission decisions and call outcomes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use sheetbridge_drive::ErrorKind;

/// An independent quota dimension
///
/// Serialized names match [`QuotaCategory::as_str`] and the config keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuotaCategory {
    /// Drive API requests per 100 seconds
    #[serde(rename = "drive_requests_100s")]
    DriveRequests100s,
    /// Drive API unit budget per local day
    #[serde(rename = "drive_daily_units")]
    DriveDailyUnits,
    /// Sheets API requests per minute
    #[serde(rename = "sheets_requests_per_minute")]
    SheetsRequestsPerMinute,
    /// Drive list queries per 100 seconds
    #[serde(rename = "drive_queries_100s")]
    DriveQueries100s,
}

impl QuotaCategory {
    /// All categories, in reporting order
    pub const ALL: [QuotaCategory; 4] = [
        QuotaCategory::DriveRequests100s,
        QuotaCategory::DriveDailyUnits,
        QuotaCategory::SheetsRequestsPerMinute,
        QuotaCategory::DriveQueries100s,
    ];

    /// Stable snake_case name (matches config keys)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaCategory::DriveRequests100s => "drive_requests_100s",
            QuotaCategory::DriveDailyUnits => "drive_daily_units",
            QuotaCategory::SheetsRequestsPerMinute => "sheets_requests_per_minute",
            QuotaCategory::DriveQueries100s => "drive_queries_100s",
        }
    }

    /// Whether this is the day-bounded unit budget
    #[must_use]
    pub fn is_daily(&self) -> bool {
        matches!(self, QuotaCategory::DriveDailyUnits)
    }

    /// Whether calls in this category also spend daily Drive units
    #[must_use]
    pub fn charges_daily_units(&self) -> bool {
        matches!(
            self,
            QuotaCategory::DriveRequests100s | QuotaCategory::DriveQueries100s
        )
    }
}

impl fmt::Display for QuotaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The call may be issued
    Allow,
    /// The call would exceed the ceiling of `category`, which resets after
    /// `retry_after`. For Drive calls this may be the daily unit budget.
    Deny {
        /// Category whose ceiling refused the call
        category: QuotaCategory,
        /// Time until that ceiling resets
        retry_after: Duration,
    },
}

impl Decision {
    /// Whether the call may be issued
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Time until the refusing ceiling resets, for a denial
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Decision::Allow => None,
            Decision::Deny { retry_after, .. } => Some(*retry_after),
        }
    }
}

/// Outcome of an issued call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// The call succeeded
    Success,
    /// The remote rejected the call for quota reasons
    QuotaRejected,
    /// Server or network failure
    TransientError,
    /// Non-retryable failure
    FatalError,
}

impl From<ErrorKind> for CallOutcome {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::QuotaExceeded => CallOutcome::QuotaRejected,
            ErrorKind::Transient => CallOutcome::TransientError,
            ErrorKind::Fatal => CallOutcome::FatalError,
        }
    }
}

/// Lifetime call counts per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTallies {
    /// Successful calls
    pub success: u64,
    /// Quota rejections
    pub quota_rejected: u64,
    /// Transient failures
    pub transient: u64,
    /// Fatal failures
    pub fatal: u64,
}

impl OutcomeTallies {
    /// Count one outcome
    pub fn add(&mut self, outcome: CallOutcome) {
        match outcome {
            CallOutcome::Success => self.success += 1,
            CallOutcome::QuotaRejected => self.quota_rejected += 1,
            CallOutcome::TransientError => self.transient += 1,
            CallOutcome::FatalError => self.fatal += 1,
        }
    }

    /// All recorded calls
    #[must_use]
    pub fn total(&self) -> u64 {
        self.success + self.quota_rejected + self.transient + self.fatal
    }
}
