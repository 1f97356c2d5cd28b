//! Governance and conversion events

use serde::Serialize;
use uuid::Uuid;

use crate::orchestrator::{JobState, Tier};
use crate::quota::{OutcomeTallies, QuotaCategory};
use sheetbridge_drive::ErrorKind;

/// Events published while calls are governed and jobs run.
///
/// Events carry ids and counts only. Error text is already sanitized by the
/// remote service layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GovernanceEvent {
    /// Running totals, published every `progress_every` calls in a category
    CallsProgress {
        /// Category
        category: QuotaCategory,
        /// Calls issued in this category since start
        calls: u64,
        /// Lifetime outcome counts
        tallies: OutcomeTallies,
    },
    /// A category crossed the warning ratio
    QuotaWarning {
        /// Category
        category: QuotaCategory,
        /// Current usage
        usage: u64,
        /// Ceiling
        ceiling: u64,
    },
    /// A failed call is about to be retried
    Retrying {
        /// Category
        category: QuotaCategory,
        /// Attempt that failed (1-based)
        attempt: u32,
        /// Backoff before the next attempt
        delay_ms: u64,
        /// Failure classification
        kind: ErrorKind,
    },
    /// A job moved from one tier to another
    TierTransition {
        /// Job id
        job_id: Uuid,
        /// Tier left
        from: Tier,
        /// Tier entered
        to: Tier,
        /// Why the first tier was abandoned
        reason: String,
    },
    /// An intermediate artifact could not be deleted
    CleanupFailed {
        /// Job id
        job_id: Uuid,
        /// Artifact that was left behind
        artifact_id: String,
        /// Failure description
        message: String,
    },
    /// A job reached its terminal state
    JobFinished {
        /// Job id
        job_id: Uuid,
        /// Terminal state
        state: JobState,
        /// Final artifact, if any
        final_artifact: Option<String>,
    },
}

impl GovernanceEvent {
    /// Job the event belongs to, for job-scoped events
    #[must_use]
    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            Self::TierTransition { job_id, .. }
            | Self::CleanupFailed { job_id, .. }
            | Self::JobFinished { job_id, .. } => Some(*job_id),
            Self::CallsProgress { .. } | Self::QuotaWarning { .. } | Self::Retrying { .. } => None,
        }
    }
}
