//! Quota tracking
//!
//! - `category`: quota dimensions, admission decisions, call outcomes
//! - `ledger`: the [`QuotaLedger`] and its usage windows
//! - `status`: read-only snapshots for reporting

mod category;
mod ledger;
mod status;

#[cfg(test)]
mod tests;

pub use category::{CallOutcome, Decision, OutcomeTallies, QuotaCategory};
pub use ledger::{QuotaLedger, UsageWindow};
pub use status::{CategoryStatus, QuotaStatus};
