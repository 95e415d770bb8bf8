//! Domain events emitted by the cache layer.
//!
//! Events are published on the client's event bus and consumed by UI code
//! (toasts, loading indicators) and by tests observing the mutation
//! lifecycle.

pub mod mutation;
pub mod view;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::EventId;

pub use mutation::MutationEvent;
pub use view::ViewEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: EventId,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A mutation lifecycle event.
    Mutation(MutationEvent),
    /// A view lifecycle event.
    View(ViewEvent),
}

impl DomainEvent {
    /// Create a new domain event stamped with the current time.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

impl From<MutationEvent> for DomainEvent {
    fn from(event: MutationEvent) -> Self {
        Self::new(EventPayload::Mutation(event))
    }
}

impl From<ViewEvent> for DomainEvent {
    fn from(event: ViewEvent) -> Self {
        Self::new(EventPayload::View(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MutationId;

    #[test]
    fn test_payload_is_tagged_by_domain() {
        let event: DomainEvent = MutationEvent::Committed {
            mutation_id: MutationId::new(),
            kind: "rename".to_string(),
        }
        .into();

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["payload"]["domain"], "Mutation");
        assert_eq!(json["payload"]["event"]["type"], "Committed");
    }
}
