//! View index: registered views, optimistic overlays, and observation.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, trace};

use drivesync_core::types::MutationId;
use drivesync_entity::{
    EntityId, StorageStats, ViewKey, ViewPayload, ViewRow, ViewSnapshot, ViewStatus,
};

use super::slot::{Overlay, ViewSlot};
use super::{PatchFn, QueryFn, ViewSnapshotSet};
use crate::store::EntityStore;

/// Registry of every view the UI has asked for.
///
/// Payloads reference the [`EntityStore`]; every change is pushed to
/// observers as a resolved [`ViewSnapshot`].
#[derive(Debug)]
pub struct ViewIndex {
    /// View key → view state.
    views: DashMap<ViewKey, ViewSlot>,
    /// Store used to resolve confirmed rows.
    store: Arc<EntityStore>,
}

impl ViewIndex {
    /// Creates an empty index over `store`.
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self {
            views: DashMap::new(),
            store,
        }
    }

    /// The store rows are resolved against.
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Whether `key` has been registered.
    pub fn is_registered(&self, key: &ViewKey) -> bool {
        self.views.contains_key(key)
    }

    /// Returns the view, registering it idle with an empty payload first
    /// if it is unknown. An existing view keeps its original query.
    pub fn get_or_create(&self, key: ViewKey, query: QueryFn) -> ViewSnapshot {
        let entry = self.views.entry(key.clone()).or_insert_with(|| {
            debug!(view = %key, "View registered");
            let payload = empty_payload(&key);
            let initial = self.render(&key, &payload, ViewStatus::Idle, 0);
            ViewSlot::new(payload, query, initial)
        });
        self.render(&key, &entry.payload, entry.status, entry.overlays.len())
    }

    /// Drops a view and its observers' sender.
    pub fn remove(&self, key: &ViewKey) -> bool {
        self.views.remove(key).is_some()
    }

    /// Every registered key.
    pub fn keys(&self) -> Vec<ViewKey> {
        self.views.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Keys of every view whose payload has a row for `id`.
    pub fn keys_containing(&self, id: &EntityId) -> Vec<ViewKey> {
        self.views
            .iter()
            .filter(|entry| entry.value().payload.contains(id))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Raw payload of a view.
    pub fn payload(&self, key: &ViewKey) -> Option<ViewPayload> {
        self.views.get(key).map(|slot| slot.payload.clone())
    }

    /// Status of a view.
    pub fn status(&self, key: &ViewKey) -> Option<ViewStatus> {
        self.views.get(key).map(|slot| slot.status)
    }

    /// The view as an observer would render it.
    pub fn resolve(&self, key: &ViewKey) -> Option<ViewSnapshot> {
        self.views
            .get(key)
            .map(|slot| self.render(key, &slot.payload, slot.status, slot.overlays.len()))
    }

    /// Subscribes to a view. The receiver always holds the latest snapshot.
    pub fn subscribe(&self, key: &ViewKey) -> Option<watch::Receiver<ViewSnapshot>> {
        self.views.get(key).map(|slot| slot.tx.subscribe())
    }

    /// Registers `key` if needed and subscribes to it. The flag is `true`
    /// when the view was created by this call and still needs populating.
    pub fn observe(&self, key: ViewKey, query: QueryFn) -> (watch::Receiver<ViewSnapshot>, bool) {
        let mut created = false;
        let entry = self.views.entry(key.clone()).or_insert_with(|| {
            created = true;
            debug!(view = %key, "View registered by observer");
            let payload = empty_payload(&key);
            let initial = self.render(&key, &payload, ViewStatus::Idle, 0);
            ViewSlot::new(payload, query, initial)
        });
        (entry.tx.subscribe(), created)
    }

    /// Number of live receivers on a view.
    pub fn observer_count(&self, key: &ViewKey) -> usize {
        self.views
            .get(key)
            .map(|slot| slot.tx.receiver_count())
            .unwrap_or(0)
    }

    /// Applies an optimistic patch and remembers it as an overlay of
    /// `mutation_id`, so refetches landing before the mutation resolves
    /// replay it. Returns `false` if the view is not registered.
    pub fn apply_optimistic_patch(&self, key: &ViewKey, mutation_id: MutationId, patch: PatchFn) -> bool {
        let Some(mut slot) = self.views.get_mut(key) else {
            return false;
        };
        patch(&mut slot.payload);
        slot.overlays.push(Overlay { mutation_id, patch });
        trace!(view = %key, mutation_id = %mutation_id, "Optimistic patch applied");
        self.publish(key, &slot);
        true
    }

    /// Folds a confirmed patch into the view and clears the overlay of
    /// `mutation_id`. Other pending overlays stay on top.
    pub fn commit(&self, key: &ViewKey, mutation_id: MutationId, patch: PatchFn) -> bool {
        let Some(mut slot) = self.views.get_mut(key) else {
            return false;
        };
        patch(&mut slot.base);
        slot.release(mutation_id);
        slot.rebuild();
        trace!(view = %key, mutation_id = %mutation_id, "Patch committed");
        self.publish(key, &slot);
        true
    }

    /// Forgets the overlay of `mutation_id` without touching the payload
    /// observers see. The next refetch drops its effect.
    pub fn discard_overlay(&self, key: &ViewKey, mutation_id: MutationId) -> bool {
        let Some(mut slot) = self.views.get_mut(key) else {
            return false;
        };
        let released = slot.release(mutation_id);
        if released {
            self.publish(key, &slot);
        }
        released
    }

    /// Marks a view stale, keeping its payload on screen.
    pub fn mark_stale(&self, key: &ViewKey) -> bool {
        let Some(mut slot) = self.views.get_mut(key) else {
            return false;
        };
        slot.status = ViewStatus::Stale;
        self.publish(key, &slot);
        true
    }

    /// Re-sends the current snapshot of every view that shows `id`, after
    /// the store copy of `id` changed underneath them.
    pub fn republish_containing(&self, id: &EntityId) {
        for entry in self.views.iter() {
            if entry.value().payload.contains(id) {
                self.publish(entry.key(), entry.value());
            }
        }
    }

    /// Captures the payloads and statuses of the registered views among
    /// `keys`.
    pub fn snapshot(&self, keys: &[ViewKey]) -> ViewSnapshotSet {
        let mut set = ViewSnapshotSet::default();
        for key in keys {
            if let Some(slot) = self.views.get(key) {
                set.insert(key.clone(), slot.payload.clone(), slot.status);
            }
        }
        set
    }

    /// Writes captured payloads back verbatim and drops stale/error flags
    /// raised since the capture. Flags the view already carried survive.
    ///
    /// Pending overlays of other mutations are not replayed; their effect
    /// returns with their own refetch.
    pub fn restore(&self, snapshot: &ViewSnapshotSet) {
        for (key, payload, captured) in snapshot.iter() {
            if let Some(mut slot) = self.views.get_mut(key) {
                slot.payload = payload.clone();
                slot.base = payload.clone();
                slot.status = restored_status(captured, slot.status);
                self.publish(key, &slot);
            }
        }
    }

    /// Rolls one mutation back: forgets its overlays and rebuilds every
    /// view it touched from the confirmed payload plus the overlays of
    /// mutations still in flight.
    ///
    /// With no sibling in flight and no refetch in between, each view in
    /// `snapshot` ends up equal to its captured payload. Rolling back never
    /// resurrects the placeholder of a sibling that already rolled back.
    pub fn roll_back(&self, snapshot: &ViewSnapshotSet, mutation_id: MutationId) {
        for mut entry in self.views.iter_mut() {
            let key = entry.key().clone();
            let slot = entry.value_mut();
            let captured = snapshot.status(&key);
            if slot.release(mutation_id) || captured.is_some() {
                slot.rebuild();
                if let Some(captured) = captured {
                    slot.status = restored_status(captured, slot.status);
                }
                self.publish(&key, slot);
            }
        }
        debug!(mutation_id = %mutation_id, views = snapshot.len(), "Views rolled back");
    }

    /// Flags a view as fetching and hands out its query.
    pub fn begin_fetch(&self, key: &ViewKey) -> Option<QueryFn> {
        let mut slot = self.views.get_mut(key)?;
        slot.status = ViewStatus::Fetching;
        self.publish(key, &slot);
        Some(Arc::clone(&slot.query))
    }

    /// Installs an authoritative payload and replays pending overlays on
    /// top of it. A view marked stale while the fetch was in flight stays
    /// stale.
    pub fn complete_fetch(&self, key: &ViewKey, payload: ViewPayload) -> bool {
        let Some(mut slot) = self.views.get_mut(key) else {
            return false;
        };
        slot.base = payload;
        slot.rebuild();
        if slot.status != ViewStatus::Stale {
            slot.status = ViewStatus::Idle;
        }
        self.publish(key, &slot);
        true
    }

    /// Flags a failed refetch. The last-known payload is retained.
    pub fn fail_fetch(&self, key: &ViewKey) -> bool {
        let Some(mut slot) = self.views.get_mut(key) else {
            return false;
        };
        slot.status = ViewStatus::Error;
        self.publish(key, &slot);
        true
    }

    fn publish(&self, key: &ViewKey, slot: &ViewSlot) {
        let snapshot = self.render(key, &slot.payload, slot.status, slot.overlays.len());
        slot.tx.send_replace(snapshot);
    }

    fn render(
        &self,
        key: &ViewKey,
        payload: &ViewPayload,
        status: ViewStatus,
        pending_overlays: usize,
    ) -> ViewSnapshot {
        let (rows, stats) = match payload {
            ViewPayload::Rows(rows) => (
                rows.iter()
                    .filter_map(|row| match row {
                        ViewRow::Confirmed(id) => self.store.get(id),
                        ViewRow::Pending(entity) => Some(entity.clone()),
                    })
                    .collect(),
                None,
            ),
            ViewPayload::Stats(stats) => (Vec::new(), Some(*stats)),
        };

        ViewSnapshot {
            key: key.clone(),
            status,
            rows,
            stats,
            pending_overlays,
        }
    }
}

/// Status a view returns to when a mutation is undone.
///
/// A fetch still in flight keeps its loading state, and one that landed
/// since the capture keeps whatever it left behind. Otherwise the captured
/// status comes back, so flags raised in between are cleared and flags the
/// view already had are kept.
fn restored_status(captured: ViewStatus, current: ViewStatus) -> ViewStatus {
    match (captured, current) {
        (_, ViewStatus::Fetching) => ViewStatus::Fetching,
        (ViewStatus::Fetching, current) => current,
        (captured, _) => captured,
    }
}

fn empty_payload(key: &ViewKey) -> ViewPayload {
    if key.holds_rows() {
        ViewPayload::Rows(Vec::new())
    } else {
        ViewPayload::Stats(StorageStats::default())
    }
}
