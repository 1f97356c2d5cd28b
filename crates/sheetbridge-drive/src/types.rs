//! Remote file types

use serde::{Deserialize, Serialize};

/// MIME type of a native Google spreadsheet
pub const GOOGLE_SHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// MIME type of an Office Open XML workbook (.xlsx)
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// MIME type of a legacy Excel workbook (.xls)
pub const XLS_MIME: &str = "application/vnd.ms-excel";

/// Metadata of a remote file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Remote file id
    pub id: String,
    /// Display name
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// Size in bytes (native Google documents report none)
    pub size: Option<u64>,
    /// Parent folder ids
    #[serde(default)]
    pub parents: Vec<String>,
}

impl FileMetadata {
    /// Create metadata without size or parents
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            size: None,
            parents: Vec::new(),
        }
    }

    /// Set the size in bytes
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Add a parent folder
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Whether this is already a native Google spreadsheet
    #[must_use]
    pub fn is_google_sheet(&self) -> bool {
        self.mime_type == GOOGLE_SHEET_MIME
    }

    /// Whether this is an Excel workbook
    #[must_use]
    pub fn is_excel(&self) -> bool {
        self.mime_type == XLSX_MIME || self.mime_type == XLS_MIME
    }

    /// Name without a trailing `.xlsx` / `.xls` extension
    #[must_use]
    pub fn base_name(&self) -> &str {
        let lower = self.name.to_ascii_lowercase();
        if lower.ends_with(".xlsx") {
            &self.name[..self.name.len() - 5]
        } else if lower.ends_with(".xls") {
            &self.name[..self.name.len() - 4]
        } else {
            &self.name
        }
    }

    /// First parent folder, if any
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

/// Metadata for a new upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadMetadata {
    /// File name
    pub name: String,
    /// MIME type of the uploaded content
    pub mime_type: String,
    /// Parent folder ids
    pub parents: Vec<String>,
}

impl UploadMetadata {
    /// Create upload metadata
    #[must_use]
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            parents: Vec::new(),
        }
    }

    /// Place the upload in the given folders
    #[must_use]
    pub fn with_parents(mut self, parents: Vec<String>) -> Self {
        self.parents = parents;
        self
    }
}
