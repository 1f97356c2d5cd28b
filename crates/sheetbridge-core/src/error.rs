//! Error types for sheetbridge-core
//!
//! [`CallError`] is what the resilient caller surfaces for a single logical
//! remote call. [`Error`] covers everything else a job can fail on.

use std::time::Duration;
use thiserror::Error;

use crate::quota::QuotaCategory;

/// Failure of one governed remote call
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// Retries exhausted against quota denials or quota rejections
    #[error("quota exhausted for {category} after {attempts} attempt(s): {message}")]
    QuotaExhausted {
        /// Category that ran out
        category: QuotaCategory,
        /// Attempts made
        attempts: u32,
        /// Time until the quota is expected to recover, if known
        retry_after: Option<Duration>,
        /// Last rejection
        message: String,
    },

    /// Retries exhausted against server or network failures
    #[error("transient failure persisted after {attempts} attempt(s): {last}")]
    TransientFailureExhausted {
        /// Attempts made
        attempts: u32,
        /// Last failure
        last: sheetbridge_drive::Error,
    },

    /// Non-retryable remote rejection
    #[error("{error}")]
    Fatal {
        /// Attempts made, counting earlier retried failures
        attempts: u32,
        /// The rejection
        error: sheetbridge_drive::Error,
    },

    /// Cancelled before a wait
    #[error("cancelled")]
    Cancelled,
}

impl CallError {
    /// The remote refused the conversion itself (unsupported or too large)
    #[must_use]
    pub fn is_conversion_rejection(&self) -> bool {
        matches!(self, CallError::Fatal { error, .. } if error.is_conversion_rejection())
    }

    /// Number of attempts made, when the call was issued at least once
    #[must_use]
    pub fn attempts(&self) -> Option<u32> {
        match self {
            CallError::QuotaExhausted { attempts, .. }
            | CallError::TransientFailureExhausted { attempts, .. }
            | CallError::Fatal { attempts, .. } => Some(*attempts),
            CallError::Cancelled => None,
        }
    }
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// A governed remote call failed
    #[error(transparent)]
    Call(#[from] CallError),

    /// Workbook content could not be processed
    #[error("workbook error: {0}")]
    Workbook(#[from] sheetbridge_workbook::Error),

    /// The source is neither a spreadsheet nor an Excel workbook
    #[error("unsupported source type: {mime_type}")]
    UnsupportedSource {
        /// Reported MIME type
        mime_type: String,
    },

    /// Invalid configuration
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// Internal failure (task join, etc.)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Human-readable error text for the CLI layer
pub trait UserFriendlyError {
    /// Short description of what went wrong
    fn user_message(&self) -> String;

    /// How to fix it, when there is something to suggest
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for CallError {
    fn user_message(&self) -> String {
        match self {
            CallError::QuotaExhausted {
                category,
                retry_after,
                ..
            } => match retry_after {
                Some(wait) => format!(
                    "⏳ API quota '{}' is exhausted. It recovers in about {} seconds.",
                    category,
                    wait.as_secs()
                ),
                None => format!("⏳ API quota '{}' is exhausted.", category),
            },
            CallError::TransientFailureExhausted { attempts, .. } => format!(
                "🌐 The remote service kept failing ({} attempts).",
                attempts
            ),
            CallError::Fatal { error, .. } => format!("❌ Request rejected: {}", error),
            CallError::Cancelled => "✋ Cancelled.".to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            CallError::QuotaExhausted { category, .. } if category.is_daily() => Some(
                "💡 The daily unit budget resets at local midnight; try again tomorrow."
                    .to_string(),
            ),
            CallError::QuotaExhausted { .. } => {
                Some("💡 Wait a few minutes, or lower the number of files per run.".to_string())
            }
            CallError::TransientFailureExhausted { .. } => {
                Some("💡 Check your network connection and retry.".to_string())
            }
            CallError::Fatal {
                error: sheetbridge_drive::Error::Credential(_),
                ..
            } => Some(
                "💡 Set a valid token in SHEETBRIDGE_DRIVE__ACCESS_TOKEN.".to_string(),
            ),
            CallError::Fatal {
                error: sheetbridge_drive::Error::PermissionDenied(_) | sheetbridge_drive::Error::NotFound(_),
                ..
            } => Some(
                "💡 Make sure the file exists and is shared with your account.".to_string(),
            ),
            CallError::Fatal { .. } | CallError::Cancelled => None,
        }
    }
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Call(e) => e.user_message(),
            Error::Workbook(e) => format!("📄 Could not process the workbook: {}", e),
            Error::UnsupportedSource { mime_type } => {
                format!("📄 Not a spreadsheet or Excel file ({}).", mime_type)
            }
            Error::InvalidConfig { field, message } => {
                format!("⚙️ Configuration error in '{}': {}", field, message)
            }
            Error::Internal(msg) => format!("❌ Internal error: {}", msg),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::Call(e) => e.suggestion(),
            Error::UnsupportedSource { .. } => {
                Some("💡 Only .xlsx, .xls and Google Sheets files can be converted.".to_string())
            }
            Error::InvalidConfig { .. } => {
                Some("💡 Check config/local.toml and SHEETBRIDGE_* variables.".to_string())
            }
            Error::Workbook(_) | Error::Internal(_) => None,
        }
    }
}
