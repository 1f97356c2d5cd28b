//! Remote Conversion Service trait definition
//!
//! This module defines the remote operations a conversion is built from.
//! Implementations perform exactly one remote call per method; retrying,
//! throttling and quota accounting are the caller's concern.

use crate::error::Result;
use crate::types::{FileMetadata, UploadMetadata};

/// Trait for remote conversion services
#[async_trait::async_trait]
pub trait ConversionService: Send + Sync {
    /// Get the service name
    fn name(&self) -> &str;

    /// Read file metadata through the file store API
    async fn metadata(&self, file_id: &str) -> Result<FileMetadata>;

    /// Read metadata of a native spreadsheet through the spreadsheet API
    async fn spreadsheet_metadata(&self, file_id: &str) -> Result<FileMetadata>;

    /// Look for an earlier conversion named like `base_name`, newest first
    async fn find_conversion(&self, base_name: &str, parent: Option<&str>)
        -> Result<Option<String>>;

    /// Convert a file server-side into a native spreadsheet named `name`,
    /// returning the id of the new artifact
    async fn convert(&self, file_id: &str, name: &str) -> Result<String>;

    /// Download raw file content
    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;

    /// Upload content as a new file, returning its id
    async fn upload(&self, content: &[u8], metadata: &UploadMetadata) -> Result<String>;

    /// Delete a file
    async fn delete(&self, file_id: &str) -> Result<()>;
}
