//! Best-effort artifact cleanup
//!
//! A failed delete is logged and reported. It never changes the job state.

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::core::ConversionOrchestrator;
use super::types::{CleanupFailure, ConversionJob};
use crate::event_bus::GovernanceEvent;
use crate::quota::QuotaCategory;

impl ConversionOrchestrator {
    /// Delete every artifact of `job` except the final one
    pub(crate) async fn cleanup(&self, job: &ConversionJob) -> Vec<CleanupFailure> {
        let mut failures = Vec::new();
        for artifact_id in job.intermediates() {
            if let Some(failure) = self.delete_artifact(job.id, artifact_id).await {
                failures.push(failure);
            }
        }
        failures
    }

    /// Delete the source file after a successful conversion
    pub(crate) async fn remove_source(&self, job: &ConversionJob) -> Option<CleanupFailure> {
        self.delete_artifact(job.id, &job.source_file_id).await
    }

    /// Delete previously converted files, one at a time.
    ///
    /// Every delete goes through the resilient caller. Files not deleted are
    /// returned as failures, including those skipped after cancellation.
    pub async fn delete_files(&self, file_ids: &[String]) -> Vec<CleanupFailure> {
        let run_id = Uuid::new_v4();
        info!(
            job_id = %run_id,
            service = self.service.name(),
            total = file_ids.len(),
            "Deleting files"
        );

        let mut failures = Vec::new();
        for file_id in file_ids {
            if self.caller.is_cancelled() {
                failures.push(CleanupFailure {
                    artifact_id: file_id.clone(),
                    message: "cancelled before delete".to_string(),
                });
                continue;
            }
            if let Some(failure) = self.delete_artifact(run_id, file_id).await {
                failures.push(failure);
            }
        }

        info!(
            job_id = %run_id,
            deleted = file_ids.len() - failures.len(),
            failed = failures.len(),
            "Deletion finished"
        );
        failures
    }

    async fn delete_artifact(&self, job_id: Uuid, artifact_id: &str) -> Option<CleanupFailure> {
        let service = self.service.as_ref();
        let result = self
            .caller
            .execute(
                QuotaCategory::DriveRequests100s,
                self.caller.costs().delete,
                move || service.delete(artifact_id),
            )
            .await;

        match result {
            Ok(()) => {
                debug!(job_id = %job_id, artifact_id, "Deleted artifact");
                None
            }
            Err(e) => {
                warn!(job_id = %job_id, artifact_id, error = %e, "Could not delete artifact");
                self.caller.events().publish(GovernanceEvent::CleanupFailed {
                    job_id,
                    artifact_id: artifact_id.to_string(),
                    message: e.to_string(),
                });
                Some(CleanupFailure {
                    artifact_id: artifact_id.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}
