//! In-process event bus for mutation and view lifecycle events.

use tokio::sync::broadcast;

use drivesync_core::config::events::EventsConfig;
use drivesync_core::events::DomainEvent;

/// Fan-out of [`DomainEvent`]s to any number of subscribers.
///
/// Publishing never blocks; subscribers that fall more than the buffer
/// size behind observe a `Lagged` error and skip ahead.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `buffer_size` events per subscriber.
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _rx) = broadcast::channel(buffer_size.max(1));
        Self { tx }
    }

    /// Create a bus from configuration.
    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.buffer_size)
    }

    /// Publish an event. Dropped silently when nobody listens.
    pub fn publish(&self, event: impl Into<DomainEvent>) {
        let _ = self.tx.send(event.into());
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
