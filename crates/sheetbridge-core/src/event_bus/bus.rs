//! Broadcast channel behind the event bus

use tokio::sync::broadcast;

use super::types::GovernanceEvent;

/// Broadcast-based event bus.
///
/// Slow subscribers miss events (lagged) rather than blocking the publisher,
/// so governed calls never wait on a reporter.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GovernanceEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning how many subscribers received it.
    /// Without subscribers the event is dropped.
    pub fn publish(&self, event: GovernanceEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
