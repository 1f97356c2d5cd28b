//! Sheetbridge Core - Quota governance and conversion orchestration
//!
//! This crate sits between the application and a rate-limited remote API:
//! - Quota: per-category usage windows and admission decisions
//! - Governor: minimum spacing between calls of one category
//! - Resilient: the single entry point for remote calls (spacing, admission,
//!   classification, backoff)
//! - Orchestrator: two-tier conversion with artifact cleanup
//! - Event bus: progress, warnings and job outcomes for observers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod governor;
pub mod orchestrator;
pub mod quota;
pub mod resilient;
pub mod retry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ConversionConfig, GovernanceConfig, Limit, MinIntervals, OperationCosts, QuotaLimits,
};
pub use error::{CallError, Error, Result, UserFriendlyError};
pub use event_bus::{EventBus, GovernanceEvent};
pub use governor::RateGovernor;
pub use orchestrator::{
    CleanupFailure, ConversionJob, ConversionOrchestrator, ConversionReport, ConversionRequest,
    JobState, TargetFormat, Tier,
};
pub use quota::{
    CallOutcome, CategoryStatus, Decision, OutcomeTallies, QuotaCategory, QuotaLedger,
    QuotaStatus, UsageWindow,
};
pub use resilient::ResilientCaller;
pub use retry::RetryConfig;
