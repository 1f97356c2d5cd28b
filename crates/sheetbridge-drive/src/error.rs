//! Error types for sheetbridge-drive

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Remote service error
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The remote reported a rate or quota limit (429 / 403 quota reasons)
    #[error("quota exceeded: {message}")]
    QuotaExceeded {
        /// Sanitized remote message
        message: String,
        /// Server supplied retry hint, if any
        retry_after: Option<Duration>,
    },

    /// Remote server failure (5xx)
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Sanitized remote message
        message: String,
    },

    /// Connection failure or reset
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("timeout: {0}")]
    Timeout(String),

    /// The remote refuses to convert this content
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The content is too large for the requested operation
    #[error("file too large: {0}")]
    SizeExceeded(String),

    /// Caller lacks permission on the file
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// File does not exist or is not visible
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Token missing, expired or rejected
    #[error("credential error: {0}")]
    Credential(String),

    /// Response body could not be understood
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// How a remote failure should be treated by a retrying caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected by a remote quota; retry after backing off
    QuotaExceeded,
    /// Server or network hiccup; retry after backing off
    Transient,
    /// Retrying cannot help
    Fatal,
}

impl Error {
    /// Classify this error for retry decisions.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            Error::Server { .. } | Error::Network(_) | Error::Timeout(_) => ErrorKind::Transient,
            Error::Unsupported(_)
            | Error::SizeExceeded(_)
            | Error::PermissionDenied(_)
            | Error::NotFound(_)
            | Error::InvalidRequest(_)
            | Error::Credential(_)
            | Error::InvalidResponse(_) => ErrorKind::Fatal,
        }
    }

    /// Server supplied retry hint (only present on quota errors).
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::QuotaExceeded { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// `true` when the remote refused the conversion itself, either because
    /// the operation is unsupported for this content or because the content
    /// is too large. Such failures may be remedied by cleaning the content.
    #[must_use]
    pub fn is_conversion_rejection(&self) -> bool {
        matches!(self, Error::Unsupported(_) | Error::SizeExceeded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let quota = Error::QuotaExceeded {
            message: "slow down".to_string(),
            retry_after: Some(Duration::from_secs(3)),
        };
        assert_eq!(quota.kind(), ErrorKind::QuotaExceeded);
        assert_eq!(quota.retry_after(), Some(Duration::from_secs(3)));

        assert_eq!(
            Error::Server {
                status: 503,
                message: "unavailable".to_string()
            }
            .kind(),
            ErrorKind::Transient
        );
        assert_eq!(Error::Timeout("30s".into()).kind(), ErrorKind::Transient);
        assert_eq!(Error::Network("reset".into()).kind(), ErrorKind::Transient);
        assert_eq!(Error::NotFound("x".into()).kind(), ErrorKind::Fatal);
        assert_eq!(Error::Credential("x".into()).kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_conversion_rejection() {
        assert!(Error::Unsupported("x".into()).is_conversion_rejection());
        assert!(Error::SizeExceeded("x".into()).is_conversion_rejection());
        assert!(!Error::PermissionDenied("x".into()).is_conversion_rejection());
        assert!(!Error::Server {
            status: 500,
            message: "internal".into()
        }
        .is_conversion_rejection());
    }
}
