//! EventBus - progress and warning events for status reporters
//!
//! The governance core never prints. Reporters subscribe here and decide how
//! to present progress, warnings and job results.

/// Broadcast channel implementation.
pub mod bus;
/// Event definitions.
pub mod types;

pub use bus::EventBus;
pub use types::GovernanceEvent;

#[cfg(test)]
mod tests;
