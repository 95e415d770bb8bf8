//! Derived views over the entity store.

pub mod index;
mod slot;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use drivesync_core::result::AppResult;
use drivesync_entity::{FetchedView, ViewKey, ViewPayload, ViewStatus};

pub use index::ViewIndex;

/// Recomputes a view from the remote source.
pub type QueryFn = Arc<dyn Fn(ViewKey) -> BoxFuture<'static, AppResult<FetchedView>> + Send + Sync>;

/// Edits a view payload in place.
///
/// Patches must be deterministic and idempotent: the index re-applies
/// pending optimistic patches on top of every refetch that lands before
/// they resolve, and after a sibling mutation rolls back.
pub type PatchFn = Arc<dyn Fn(&mut ViewPayload) + Send + Sync>;

/// Payloads and statuses captured before a mutation, used to roll it back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshotSet {
    /// View key → payload and status at capture time.
    views: HashMap<ViewKey, (ViewPayload, ViewStatus)>,
}

impl ViewSnapshotSet {
    /// Captured payload of one view.
    pub fn get(&self, key: &ViewKey) -> Option<&ViewPayload> {
        self.views.get(key).map(|(payload, _)| payload)
    }

    /// Captured status of one view.
    pub fn status(&self, key: &ViewKey) -> Option<ViewStatus> {
        self.views.get(key).map(|(_, status)| *status)
    }

    /// Keys of every captured view.
    pub fn keys(&self) -> impl Iterator<Item = &ViewKey> {
        self.views.keys()
    }

    /// Number of captured views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub(crate) fn insert(&mut self, key: ViewKey, payload: ViewPayload, status: ViewStatus) {
        self.views.insert(key, (payload, status));
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ViewKey, &ViewPayload, ViewStatus)> {
        self.views
            .iter()
            .map(|(key, (payload, status))| (key, payload, *status))
    }
}
