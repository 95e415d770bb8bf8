//! View keys, payloads, and the resolved snapshots handed to observers.

pub mod key;
pub mod payload;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;

pub use key::ViewKey;
pub use payload::{FetchedView, StorageStats, ViewPayload, ViewRow};

/// Freshness of a cached view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewStatus {
    /// Payload reflects the last fetch plus any pending overlay.
    Idle,
    /// A refetch is in flight; the last-known payload is still shown.
    Fetching,
    /// Out of date, refetch queued; the last-known payload is still shown.
    Stale,
    /// The last refetch failed; the last-known payload is retained.
    Error,
}

/// A view as rendered: rows resolved through the entity store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    /// Which view this is.
    pub key: ViewKey,
    /// Freshness.
    pub status: ViewStatus,
    /// Resolved rows, in view order. Empty for `stats`.
    pub rows: Vec<Entity>,
    /// Aggregate numbers, only for `stats`.
    pub stats: Option<StorageStats>,
    /// Number of unresolved optimistic overlays on this view.
    pub pending_overlays: usize,
}

impl ViewSnapshot {
    /// Names of the rows, in order. Handy for assertions and logs.
    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(Entity::name).collect()
    }

    /// Whether a loading affordance should be shown.
    pub fn is_loading(&self) -> bool {
        matches!(self.status, ViewStatus::Fetching)
    }
}
