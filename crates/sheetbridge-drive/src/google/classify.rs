use std::time::Duration;

use super::types::ErrorEnvelope;
use crate::error::Error;
use crate::util::sanitize_api_error;

/// 403 reasons Google uses for rate and quota rejections
const QUOTA_REASONS: &[&str] = &[
    "ratelimitexceeded",
    "userratelimitexceeded",
    "quotaexceeded",
    "dailylimitexceeded",
    "sharingratelimitexceeded",
];

/// Message fragments reported when a file is too large to convert
const SIZE_MARKERS: &[&str] = &["too large", "exceeds", "maximum size", "size limit"];

/// Message fragments and reasons reported when a conversion is refused
const UNSUPPORTED_MARKERS: &[&str] = &[
    "cannotcopyfile",
    "conversion is not supported",
    "not supported",
    "unsupported",
    "cannot be converted",
];

/// Map a non-success HTTP response to a classified [`Error`].
///
/// `body` is the raw response text; Google JSON error envelopes are parsed
/// for their message and reasons, anything else is used verbatim.
#[must_use]
pub fn classify_response(status: u16, body: &str, retry_after: Option<Duration>) -> Error {
    let (message, reasons) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let reasons: Vec<String> = envelope
                .error
                .errors
                .iter()
                .map(|d| d.reason.to_lowercase())
                .collect();
            (envelope.error.message, reasons)
        }
        Err(_) => (body.trim().to_string(), Vec::new()),
    };
    let message = if message.is_empty() {
        format!("HTTP {status}")
    } else {
        sanitize_api_error(&message)
    };
    let lower = message.to_lowercase();
    let has_reason = |set: &[&str]| reasons.iter().any(|r| set.contains(&r.as_str()));
    let mentions = |set: &[&str]| {
        set.iter()
            .any(|m| lower.contains(m) || reasons.iter().any(|r| r.contains(m)))
    };

    match status {
        429 => Error::QuotaExceeded {
            message,
            retry_after,
        },
        403 if has_reason(QUOTA_REASONS) || lower.contains("rate limit") => {
            Error::QuotaExceeded {
                message,
                retry_after,
            }
        }
        403 if mentions(UNSUPPORTED_MARKERS) => Error::Unsupported(message),
        403 => Error::PermissionDenied(message),
        401 => Error::Credential(message),
        404 => Error::NotFound(message),
        408 => Error::Timeout(message),
        413 => Error::SizeExceeded(message),
        400..=499 if mentions(SIZE_MARKERS) => Error::SizeExceeded(message),
        400..=499 if mentions(UNSUPPORTED_MARKERS) => Error::Unsupported(message),
        400..=499 => Error::InvalidRequest(message),
        500..=599 => Error::Server { status, message },
        _ => Error::InvalidResponse(format!("unexpected status {status}: {message}")),
    }
}

/// Parse a `Retry-After` header given in seconds
pub(crate) fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
