//! Source inspection and the two conversion tiers

use std::sync::Arc;
use tracing::{debug, info, warn};

use sheetbridge_drive::{FileMetadata, UploadMetadata, XLSX_MIME};

use super::core::ConversionOrchestrator;
use super::types::ConversionJob;
use crate::error::{CallError, Error, Result};
use crate::quota::QuotaCategory;

impl ConversionOrchestrator {
    /// Read source metadata through Drive, falling back to the Sheets API
    /// when Drive rejects the request outright.
    pub(crate) async fn inspect(&self, file_id: &str) -> std::result::Result<FileMetadata, CallError> {
        let service = self.service.as_ref();
        let cost = self.caller.costs().read;

        let (attempts, drive_error) = match self
            .caller
            .execute(QuotaCategory::DriveRequests100s, cost, move || {
                service.metadata(file_id)
            })
            .await
        {
            Ok(metadata) => return Ok(metadata),
            Err(CallError::Fatal { attempts, error }) => (attempts, error),
            Err(other) => return Err(other),
        };

        debug!(file_id, error = %drive_error, "Drive metadata failed, trying Sheets API");
        self.caller
            .execute(QuotaCategory::SheetsRequestsPerMinute, cost, move || {
                service.spreadsheet_metadata(file_id)
            })
            .await
            .map_err(|_| CallError::Fatal {
                attempts,
                error: drive_error,
            })
    }

    /// Look for an earlier conversion of `source` in the same folder
    pub(crate) async fn find_existing(&self, source: &FileMetadata) -> Option<String> {
        let service = self.service.as_ref();
        let base_name = source.base_name();
        let parent = source.parent();

        match self
            .caller
            .execute(
                QuotaCategory::DriveQueries100s,
                self.caller.costs().query,
                move || service.find_conversion(base_name, parent),
            )
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(file_id = %source.id, error = %e, "Lookup of existing conversion failed");
                None
            }
        }
    }

    /// Server-side conversion of the source as-is
    pub(crate) async fn standard_tier(
        &self,
        job: &mut ConversionJob,
        source: &FileMetadata,
    ) -> std::result::Result<String, CallError> {
        let service = self.service.as_ref();
        let source_id = source.id.as_str();
        let name = source.base_name();

        let artifact = self
            .caller
            .execute(
                QuotaCategory::DriveRequests100s,
                self.caller.costs().copy,
                move || service.convert(source_id, name),
            )
            .await?;
        job.record_artifact(artifact.clone());
        info!(job_id = %job.id, spreadsheet = %artifact, "Standard conversion succeeded");
        Ok(artifact)
    }

    /// Download, strip non-convertible columns, upload a staging copy and
    /// convert that. Both remote artifacts are recorded on the job.
    pub(crate) async fn enhanced_tier(
        &self,
        job: &mut ConversionJob,
        source: &FileMetadata,
    ) -> Result<String> {
        let service = self.service.as_ref();
        let costs = self.caller.costs().clone();
        let source_id = source.id.as_str();
        let base_name = source.base_name();

        let content = self
            .caller
            .execute(QuotaCategory::DriveRequests100s, costs.read, move || {
                service.download(source_id)
            })
            .await?;
        debug!(job_id = %job.id, bytes = content.len(), "Downloaded source");

        let sanitizer = Arc::clone(&self.sanitizer);
        let sanitized = tokio::task::spawn_blocking(move || sanitizer.sanitize(&content))
            .await
            .map_err(|e| Error::Internal(format!("sanitizer task failed: {e}")))??;
        info!(
            job_id = %job.id,
            sheets = sanitized.report.sheets.len(),
            skipped_sheets = sanitized.report.skipped_sheets.len(),
            removed_columns = sanitized.report.removed_columns(),
            "Cleaned workbook"
        );

        let metadata = UploadMetadata::new(
            format!("{}{}.xlsx", base_name, self.config.processed_suffix),
            XLSX_MIME,
        )
        .with_parents(source.parents.clone());
        let upload_content = sanitized.content.as_slice();
        let upload_metadata = &metadata;
        let staging = self
            .caller
            .execute(QuotaCategory::DriveRequests100s, costs.create, move || {
                service.upload(upload_content, upload_metadata)
            })
            .await?;
        job.record_artifact(staging.clone());

        let staging_id = staging.as_str();
        let artifact = self
            .caller
            .execute(QuotaCategory::DriveRequests100s, costs.convert, move || {
                service.convert(staging_id, base_name)
            })
            .await?;
        job.record_artifact(artifact.clone());
        info!(job_id = %job.id, spreadsheet = %artifact, "Enhanced conversion succeeded");
        Ok(artifact)
    }
}
