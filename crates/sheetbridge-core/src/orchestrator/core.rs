//! Orchestrator core structure
//!
//! Drives each job through its state machine:
//!
//! ```text
//! inspect ─┬─ native sheet / reused ──────────────► Succeeded
//!          ├─ not a workbook ─────────────────────► Failed
//!          └─ Standard ─┬─ ok ────────────────────► Succeeded
//!                       ├─ not eligible ──────────► Failed
//!                       └─ Enhanced ─┬─ ok ───────► Succeeded
//!                                    └─ error ────► FailedBothTiers
//! ```
//!
//! Cleanup runs after every path that created artifacts.

use std::sync::Arc;
use tracing::{info, warn};

use sheetbridge_drive::{ConversionService, FileMetadata};
use sheetbridge_workbook::{ContentSanitizer, XlsxSanitizer};

use super::types::{
    CleanupFailure, ConversionJob, ConversionReport, ConversionRequest, JobState, Tier,
};
use crate::config::ConversionConfig;
use crate::error::{CallError, Error, UserFriendlyError};
use crate::event_bus::GovernanceEvent;
use crate::resilient::ResilientCaller;

/// Two-tier conversion orchestrator
pub struct ConversionOrchestrator {
    pub(crate) service: Arc<dyn ConversionService>,
    pub(crate) caller: Arc<ResilientCaller>,
    pub(crate) sanitizer: Arc<dyn ContentSanitizer>,
    pub(crate) config: ConversionConfig,
}

/// What happened before cleanup
#[derive(Default)]
struct Outcome {
    converted: bool,
    standard_error: Option<String>,
    enhanced_error: Option<String>,
    failure: Option<String>,
    suggestion: Option<String>,
}

impl Outcome {
    /// Keep the user-facing wording of the error that ended the job
    fn fail_with(&mut self, error: &dyn UserFriendlyError) {
        self.failure = Some(error.user_message());
        self.suggestion = error.suggestion();
    }
}

impl ConversionOrchestrator {
    /// Create an orchestrator using the xlsx sanitizer with default rules
    #[must_use]
    pub fn new(
        service: Arc<dyn ConversionService>,
        caller: Arc<ResilientCaller>,
        config: ConversionConfig,
    ) -> Self {
        Self {
            service,
            caller,
            sanitizer: Arc::new(XlsxSanitizer::default()),
            config,
        }
    }

    /// Use a different content sanitizer for the enhanced tier
    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn ContentSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Conversion settings
    #[must_use]
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// The caller every remote operation goes through
    #[must_use]
    pub fn caller(&self) -> &ResilientCaller {
        &self.caller
    }

    /// Convert several files, one job at a time. Stops starting new jobs
    /// once cancellation is requested.
    pub async fn convert_all(&self, requests: Vec<ConversionRequest>) -> Vec<ConversionReport> {
        let total = requests.len();
        let mut reports = Vec::with_capacity(total);
        info!(service = self.service.name(), total, "Starting conversions");
        for (index, request) in requests.into_iter().enumerate() {
            if self.caller.is_cancelled() {
                warn!(remaining = total - index, "Cancelled, skipping remaining files");
                break;
            }
            info!(file = index + 1, total, file_id = %request.file_id, "Converting file");
            reports.push(self.convert(request).await);
        }
        reports
    }

    /// Convert one file. Never fails: the outcome is in the report.
    pub async fn convert(&self, request: ConversionRequest) -> ConversionReport {
        let mut job = ConversionJob::new(&request);
        let mut outcome = Outcome::default();
        info!(job_id = %job.id, file_id = %job.source_file_id, "Conversion started");

        self.run(&mut job, &mut outcome).await;

        let mut cleanup_failures = Vec::new();
        if self.config.keep_intermediates {
            info!(
                job_id = %job.id,
                kept = job.intermediates().count(),
                "Keeping intermediate artifacts"
            );
        } else {
            cleanup_failures.extend(self.cleanup(&job).await);
        }

        if self.config.remove_source && job.state == JobState::Succeeded && outcome.converted {
            if let Some(failure) = self.remove_source(&job).await {
                cleanup_failures.push(failure);
            }
        }

        self.finish(job, outcome, cleanup_failures)
    }

    async fn run(&self, job: &mut ConversionJob, outcome: &mut Outcome) {
        let source = match self.inspect(&job.source_file_id).await {
            Ok(source) => source,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Could not read source metadata");
                outcome.standard_error = Some(e.to_string());
                outcome.fail_with(&e);
                job.state = JobState::Failed;
                return;
            }
        };

        if source.is_google_sheet() {
            info!(job_id = %job.id, "Source is already a spreadsheet");
            job.succeed(source.id.clone());
            return;
        }
        if !source.is_excel() {
            let error = Error::UnsupportedSource {
                mime_type: source.mime_type.clone(),
            };
            warn!(job_id = %job.id, error = %error, "Source cannot be converted");
            outcome.standard_error = Some(error.to_string());
            outcome.fail_with(&error);
            job.state = JobState::Failed;
            return;
        }

        if self.config.reuse_existing {
            if let Some(existing) = self.find_existing(&source).await {
                info!(job_id = %job.id, spreadsheet = %existing, "Reusing existing conversion");
                job.succeed(existing);
                return;
            }
        }

        job.enter(Tier::Standard);
        let standard = match self.standard_tier(job, &source).await {
            Ok(artifact) => {
                outcome.converted = true;
                job.succeed(artifact);
                return;
            }
            Err(e) => e,
        };
        outcome.standard_error = Some(standard.to_string());

        if !self.qualifies_for_enhanced(&standard, &source) {
            warn!(job_id = %job.id, error = %standard, "Standard conversion failed");
            outcome.fail_with(&standard);
            job.state = JobState::Failed;
            return;
        }

        info!(
            job_id = %job.id,
            reason = %standard,
            size = source.size.unwrap_or(0),
            "Falling back to enhanced conversion"
        );
        self.caller.events().publish(GovernanceEvent::TierTransition {
            job_id: job.id,
            from: Tier::Standard,
            to: Tier::Enhanced,
            reason: standard.to_string(),
        });
        job.enter(Tier::Enhanced);

        match self.enhanced_tier(job, &source).await {
            Ok(artifact) => {
                outcome.converted = true;
                job.succeed(artifact);
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Enhanced conversion failed");
                outcome.enhanced_error = Some(e.to_string());
                outcome.fail_with(&e);
                job.state = JobState::FailedBothTiers;
            }
        }
    }

    /// A conversion rejection, or any failure on a large source, moves the
    /// job to the enhanced tier. Cancellation never does.
    fn qualifies_for_enhanced(&self, error: &CallError, source: &FileMetadata) -> bool {
        if matches!(error, CallError::Cancelled) {
            return false;
        }
        let large = source
            .size
            .is_some_and(|size| size > self.config.size_threshold_bytes);
        error.is_conversion_rejection() || large
    }

    fn finish(
        &self,
        job: ConversionJob,
        outcome: Outcome,
        cleanup_failures: Vec<CleanupFailure>,
    ) -> ConversionReport {
        info!(
            job_id = %job.id,
            state = ?job.state,
            final_artifact = job.final_artifact.as_deref().unwrap_or("-"),
            cleanup_failures = cleanup_failures.len(),
            "Conversion finished"
        );
        self.caller.events().publish(GovernanceEvent::JobFinished {
            job_id: job.id,
            state: job.state,
            final_artifact: job.final_artifact.clone(),
        });

        ConversionReport {
            job_id: job.id,
            source_file_id: job.source_file_id,
            target_format: job.target_format,
            state: job.state,
            tiers_attempted: job.tiers_attempted,
            final_artifact: job.final_artifact,
            converted: outcome.converted,
            cleanup_failures,
            standard_error: outcome.standard_error,
            enhanced_error: outcome.enhanced_error,
            failure: outcome.failure,
            suggestion: outcome.suggestion,
            quota: self.caller.status(),
        }
    }
}
