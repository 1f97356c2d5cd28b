//! Two-Tier Conversion Orchestrator
//!
//! Converts a workbook with the remote service's own converter first
//! (Standard tier). When that is rejected as unsupported or too large, or
//! fails in any way for a large source, the Enhanced tier downloads the
//! workbook, strips non-convertible columns and converts a cleaned copy.
//!
//! All remote traffic goes through [`crate::ResilientCaller`].

mod cleanup;
mod core;
mod tiers;
mod types;


pub use self::core::ConversionOrchestrator;
pub use types::{
    CleanupFailure, ConversionJob, ConversionReport, ConversionRequest, JobState, TargetFormat,
    Tier,
};
