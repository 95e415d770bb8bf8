//! A single registered view.

use std::fmt;

use tokio::sync::watch;

use drivesync_core::types::MutationId;
use drivesync_entity::{ViewPayload, ViewSnapshot, ViewStatus};

use super::{PatchFn, QueryFn};

/// An optimistic patch that has not been committed or rolled back yet.
pub(crate) struct Overlay {
    pub(crate) mutation_id: MutationId,
    pub(crate) patch: PatchFn,
}

/// State held for one view key.
pub(crate) struct ViewSlot {
    /// What observers see: `base` with every pending overlay applied.
    pub(crate) payload: ViewPayload,
    /// Last fetched payload plus committed patches, without overlays.
    pub(crate) base: ViewPayload,
    pub(crate) status: ViewStatus,
    pub(crate) query: QueryFn,
    /// Pending overlays, in submission order.
    pub(crate) overlays: Vec<Overlay>,
    pub(crate) tx: watch::Sender<ViewSnapshot>,
}

impl ViewSlot {
    pub(crate) fn new(payload: ViewPayload, query: QueryFn, initial: ViewSnapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            base: payload.clone(),
            payload,
            status: ViewStatus::Idle,
            query,
            overlays: Vec::new(),
            tx,
        }
    }

    /// Drops the overlay of one mutation. Returns whether it was present.
    pub(crate) fn release(&mut self, mutation_id: MutationId) -> bool {
        let before = self.overlays.len();
        self.overlays.retain(|o| o.mutation_id != mutation_id);
        self.overlays.len() != before
    }

    /// Recomputes the payload from `base` and the pending overlays.
    pub(crate) fn rebuild(&mut self) {
        self.payload = self.base.clone();
        for overlay in &self.overlays {
            (overlay.patch)(&mut self.payload);
        }
    }
}

impl fmt::Debug for ViewSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSlot")
            .field("payload", &self.payload)
            .field("status", &self.status)
            .field("overlays", &self.overlays.len())
            .field("observers", &self.tx.receiver_count())
            .finish()
    }
}
