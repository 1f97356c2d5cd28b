//! Tests for the Google service module

use super::classify::parse_retry_after;
use super::provider::{escape_query_value, multipart_related};
use super::types::DriveFile;
use super::*;
use crate::error::{Error, ErrorKind};
use crate::types::FileMetadata;
use std::time::Duration;

fn google_error(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "errors": [{ "domain": "usageLimits", "reason": reason, "message": message }]
        }
    })
    .to_string()
}

#[test]
fn test_429_is_quota() {
    let err = classify_response(429, "Too Many Requests", Some(Duration::from_secs(7)));
    assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
}

#[test]
fn test_403_quota_reasons() {
    for reason in ["userRateLimitExceeded", "rateLimitExceeded", "dailyLimitExceeded"] {
        let body = google_error(403, reason, "User rate limit exceeded.");
        let err = classify_response(403, &body, None);
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded, "reason {reason}");
    }
}

#[test]
fn test_403_without_quota_reason_is_permission_denied() {
    let body = google_error(403, "insufficientFilePermissions", "The user does not have sufficient permissions for this file.");
    let err = classify_response(403, &body, None);
    assert!(matches!(err, Error::PermissionDenied(_)));
    assert_eq!(err.kind(), ErrorKind::Fatal);
}

#[test]
fn test_403_cannot_copy_is_unsupported() {
    let body = google_error(403, "cannotCopyFile", "This file cannot be copied by the user.");
    let err = classify_response(403, &body, None);
    assert!(err.is_conversion_rejection());
}

#[test]
fn test_400_size_is_size_exceeded() {
    let body = google_error(400, "badRequest", "This file is too large to be converted.");
    let err = classify_response(400, &body, None);
    assert!(matches!(err, Error::SizeExceeded(_)));
    assert!(err.is_conversion_rejection());
}

#[test]
fn test_400_other_is_invalid_request() {
    let body = google_error(400, "invalid", "Invalid field selection foo");
    let err = classify_response(400, &body, None);
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[test]
fn test_status_mapping() {
    assert!(matches!(classify_response(401, "", None), Error::Credential(_)));
    assert!(matches!(classify_response(404, "", None), Error::NotFound(_)));
    assert!(matches!(classify_response(413, "", None), Error::SizeExceeded(_)));
    let server = classify_response(503, "Service Unavailable", None);
    assert!(matches!(server, Error::Server { status: 503, .. }));
    assert_eq!(server.kind(), ErrorKind::Transient);
}

#[test]
fn test_408_is_transient_timeout() {
    let err = classify_response(408, "Request Timeout", None);
    assert!(matches!(err, Error::Timeout(_)));
    assert_eq!(err.kind(), ErrorKind::Transient);
}

#[test]
fn test_empty_body_falls_back_to_status() {
    match classify_response(404, "   ", None) {
        Error::NotFound(message) => assert_eq!(message, "HTTP 404"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_parse_retry_after() {
    assert_eq!(parse_retry_after(Some("12")), Some(Duration::from_secs(12)));
    assert_eq!(parse_retry_after(Some("soon")), None);
    assert_eq!(parse_retry_after(None), None);
}

#[test]
fn test_escape_query_value() {
    assert_eq!(escape_query_value("Bob's sheet"), "Bob\\'s sheet");
    assert_eq!(escape_query_value("a\\b"), "a\\\\b");
}

#[test]
fn test_multipart_related_layout() {
    let metadata = serde_json::json!({ "name": "report.xlsx" });
    let body = multipart_related(&metadata, b"PK\x03\x04", "application/zip", "b0");
    let text = String::from_utf8_lossy(&body);

    assert!(text.starts_with("--b0\r\nContent-Type: application/json"));
    assert!(text.contains("{\"name\":\"report.xlsx\"}"));
    assert!(text.contains("Content-Type: application/zip\r\n\r\nPK"));
    assert!(text.ends_with("\r\n--b0--\r\n"));
}

#[test]
fn test_drive_file_size_parsing() {
    let file: DriveFile = serde_json::from_str(
        r#"{"id":"abc","name":"big.xlsx","mimeType":"application/vnd.ms-excel","size":"10485761","parents":["root"]}"#,
    )
    .unwrap();
    let meta: FileMetadata = file.into();
    assert_eq!(meta.size, Some(10_485_761));
    assert_eq!(meta.parent(), Some("root"));

    let native: DriveFile = serde_json::from_str(r#"{"id":"s1"}"#).unwrap();
    let meta: FileMetadata = native.into();
    assert_eq!(meta.size, None);
    assert!(meta.name.is_empty());
}

#[test]
fn test_config_base_url_override() {
    let config = DriveConfig::new()
        .with_base_url("http://127.0.0.1:9000")
        .with_timeout(Duration::from_secs(5));
    assert_eq!(config.drive_base_url, "http://127.0.0.1:9000/drive/v3");
    assert_eq!(config.upload_base_url, "http://127.0.0.1:9000/upload/drive/v3");
    assert_eq!(config.sheets_base_url, "http://127.0.0.1:9000/v4");
    assert_eq!(config.timeout, Duration::from_secs(5));
}
