//! Conversion job types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quota::QuotaStatus;

/// Output format of a conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFormat {
    /// Native Google spreadsheet
    #[default]
    GoogleSheet,
}

/// Conversion strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Server-side conversion of the source as-is
    Standard,
    /// Download, strip non-convertible content, re-upload and convert
    Enhanced,
}

/// State of a conversion job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Not finished yet
    Running,
    /// A final artifact exists
    Succeeded,
    /// Standard failed and Enhanced failed too
    FailedBothTiers,
    /// Failed without reaching the Enhanced tier
    Failed,
}

impl JobState {
    /// Whether the job has finished
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Running)
    }
}

/// A request to convert one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Remote id of the source file
    pub file_id: String,
    /// Desired output
    pub target_format: TargetFormat,
}

impl ConversionRequest {
    /// Convert `file_id` to a native spreadsheet
    #[must_use]
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            target_format: TargetFormat::GoogleSheet,
        }
    }
}

/// One conversion attempt, owned by the orchestrator while it runs
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Job id
    pub id: Uuid,
    /// Source file id
    pub source_file_id: String,
    /// Desired output
    pub target_format: TargetFormat,
    /// Current tier
    pub tier: Tier,
    /// Current state
    pub state: JobState,
    /// Tiers entered, in order
    pub tiers_attempted: Vec<Tier>,
    /// Successful result, once known
    pub final_artifact: Option<String>,
    artifacts: Vec<String>,
}

impl ConversionJob {
    /// Start a job for `request`
    #[must_use]
    pub fn new(request: &ConversionRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_file_id: request.file_id.clone(),
            target_format: request.target_format,
            tier: Tier::Standard,
            state: JobState::Running,
            tiers_attempted: Vec::new(),
            final_artifact: None,
            artifacts: Vec::new(),
        }
    }

    /// Enter `tier`
    pub fn enter(&mut self, tier: Tier) {
        self.tier = tier;
        self.tiers_attempted.push(tier);
    }

    /// Append a remote artifact created by this job
    pub fn record_artifact(&mut self, artifact_id: impl Into<String>) {
        self.artifacts.push(artifact_id.into());
    }

    /// Every artifact created, in creation order
    #[must_use]
    pub fn artifacts(&self) -> &[String] {
        &self.artifacts
    }

    /// Artifacts to clean up: everything except the final artifact
    pub fn intermediates(&self) -> impl Iterator<Item = &str> {
        let keep = self.final_artifact.as_deref();
        self.artifacts
            .iter()
            .map(String::as_str)
            .filter(move |id| Some(*id) != keep)
    }

    /// Finish successfully with `artifact_id`
    pub fn succeed(&mut self, artifact_id: impl Into<String>) {
        self.final_artifact = Some(artifact_id.into());
        self.state = JobState::Succeeded;
    }
}

/// A best-effort delete that did not go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupFailure {
    /// Artifact left behind
    pub artifact_id: String,
    /// Failure description
    pub message: String,
}

/// Outcome of one job as reported to the caller
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Job id
    pub job_id: Uuid,
    /// Source file id
    pub source_file_id: String,
    /// Desired output
    pub target_format: TargetFormat,
    /// Terminal state
    pub state: JobState,
    /// Tiers entered, in order
    pub tiers_attempted: Vec<Tier>,
    /// Resulting spreadsheet id
    pub final_artifact: Option<String>,
    /// Whether a conversion ran (false for native or reused spreadsheets)
    pub converted: bool,
    /// Deletes that failed
    pub cleanup_failures: Vec<CleanupFailure>,
    /// Why the standard tier (or inspection) failed
    pub standard_error: Option<String>,
    /// Why the enhanced tier failed
    pub enhanced_error: Option<String>,
    /// User-facing description of the error that ended a failed job
    pub failure: Option<String>,
    /// How to fix it, when there is something to suggest
    pub suggestion: Option<String>,
    /// Quota usage after the job
    pub quota: QuotaStatus,
}

impl ConversionReport {
    /// Whether the job succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == JobState::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intermediates_exclude_final_artifact() {
        let mut job = ConversionJob::new(&ConversionRequest::new("src"));
        job.record_artifact("staging");
        job.record_artifact("sheet");
        assert_eq!(job.intermediates().collect::<Vec<_>>(), vec!["staging", "sheet"]);

        job.succeed("sheet");
        assert_eq!(job.intermediates().collect::<Vec<_>>(), vec!["staging"]);
        assert_eq!(job.artifacts(), ["staging".to_string(), "sheet".to_string()]);
        assert!(job.state.is_terminal());
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_string(&JobState::FailedBothTiers).unwrap(),
            "\"failed_both_tiers\""
        );
        assert_eq!(serde_json::to_string(&Tier::Enhanced).unwrap(), "\"enhanced\"");
        assert!(!JobState::Running.is_terminal());
    }
}
