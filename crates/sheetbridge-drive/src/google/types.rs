use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::FileMetadata;

/// Drive v3 REST base URL
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Drive v3 media upload base URL
pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Sheets v4 REST base URL
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// Fields requested for every Drive file resource
pub(crate) const FILE_FIELDS: &str = "id,name,mimeType,size,parents";

/// Google service configuration
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Drive REST base URL
    pub drive_base_url: String,
    /// Drive upload base URL
    pub upload_base_url: String,
    /// Sheets REST base URL
    pub sheets_base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            drive_base_url: DRIVE_API_BASE.to_string(),
            upload_base_url: DRIVE_UPLOAD_BASE.to_string(),
            sheets_base_url: SHEETS_API_BASE.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl DriveConfig {
    /// Create a configuration pointing at the public Google endpoints
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point all endpoints at one base (used against local fakes)
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.drive_base_url = format!("{base}/drive/v3");
        self.upload_base_url = format!("{base}/upload/drive/v3");
        self.sheets_base_url = format!("{base}/v4");
        self
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Drive `File` resource (subset)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    /// Drive reports sizes as decimal strings
    pub size: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}

impl From<DriveFile> for FileMetadata {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            size: file.size.and_then(|s| s.parse().ok()),
            parents: file.parents,
        }
    }
}

/// Drive `files.list` response
#[derive(Debug, Deserialize)]
pub(crate) struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

/// Drive `files.copy` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CopyRequest<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
}

/// Sheets `spreadsheets.get` response (subset)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Spreadsheet {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub properties: SpreadsheetProperties,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SpreadsheetProperties {
    #[serde(default)]
    pub title: String,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub reason: String,
}
