//! The action surface UI code talks to.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use drivesync_cache::{EntityStore, QueryFn, ViewIndex};
use drivesync_core::config::AppConfig;
use drivesync_core::error::AppError;
use drivesync_core::events::DomainEvent;
use drivesync_core::result::AppResult;
use drivesync_entity::{EntityId, ViewKey, ViewSnapshot};

use crate::clipboard::{self, Clipboard, ClipboardAction, ClipboardItem, UiState};
use crate::events::EventBus;
use crate::invalidation::{FlushSummary, InvalidationScheduler};
use crate::mutation::{
    BulkOutcome, MutationCoordinator, MutationDescriptor, MutationError, MutationOutcome,
};
use crate::remote::{RemoteResourceApi, TimeoutRemote};

/// Entry point of the cache: owns the store, the views, the coordinator,
/// the scheduler and the UI state, all wired to one remote.
///
/// Cheap to clone; every field is shared.
#[derive(Debug, Clone)]
pub struct DriveClient {
    store: Arc<EntityStore>,
    views: Arc<ViewIndex>,
    remote: Arc<dyn RemoteResourceApi>,
    coordinator: MutationCoordinator,
    scheduler: InvalidationScheduler,
    events: EventBus,
    ui: Arc<UiState>,
}

impl DriveClient {
    /// Builds a client over `remote` with fresh UI state.
    ///
    /// Every remote call is bounded by `remote.timeout_ms`.
    pub fn new(config: &AppConfig, remote: Arc<dyn RemoteResourceApi>) -> Self {
        Self::with_ui_state(config, remote, Arc::new(UiState::new()))
    }

    /// Builds a client sharing an existing [`UiState`].
    pub fn with_ui_state(
        config: &AppConfig,
        remote: Arc<dyn RemoteResourceApi>,
        ui: Arc<UiState>,
    ) -> Self {
        let remote: Arc<dyn RemoteResourceApi> =
            Arc::new(TimeoutRemote::from_config(remote, &config.remote));
        let store = Arc::new(EntityStore::new());
        let views = Arc::new(ViewIndex::new(Arc::clone(&store)));
        let events = EventBus::from_config(&config.events);
        let scheduler =
            InvalidationScheduler::from_config(Arc::clone(&views), events.clone(), &config.scheduler);
        let coordinator = MutationCoordinator::new(
            Arc::clone(&views),
            Arc::clone(&remote),
            scheduler.clone(),
            events.clone(),
            &config.cache,
        );

        info!(
            timeout_ms = config.remote.timeout_ms,
            coalesce_window_ms = config.scheduler.coalesce_window_ms,
            "Drive client ready"
        );

        Self {
            store,
            views,
            remote,
            coordinator,
            scheduler,
            events,
            ui,
        }
    }

    /// Canonical entities.
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Registered views.
    pub fn views(&self) -> &Arc<ViewIndex> {
        &self.views
    }

    /// The mutation pipeline.
    pub fn coordinator(&self) -> &MutationCoordinator {
        &self.coordinator
    }

    /// The refetch scheduler.
    pub fn scheduler(&self) -> &InvalidationScheduler {
        &self.scheduler
    }

    /// Clipboard and selection.
    pub fn ui(&self) -> &Arc<UiState> {
        &self.ui
    }

    /// Subscribes to mutation and view lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    // ── Mutations ────────────────────────────────────────────

    /// Applies one mutation optimistically and reconciles it with the
    /// remote.
    pub async fn submit_mutation(
        &self,
        descriptor: MutationDescriptor,
    ) -> Result<MutationOutcome, MutationError> {
        self.coordinator.execute(descriptor).await
    }

    /// Runs independent mutations together. Each commits or rolls back on
    /// its own.
    pub async fn submit_bulk<I>(&self, descriptors: I) -> BulkOutcome
    where
        I: IntoIterator<Item = MutationDescriptor>,
    {
        self.coordinator.execute_bulk(descriptors).await
    }

    // ── Views ────────────────────────────────────────────────

    /// Subscribes to a view. An unknown view is registered and its first
    /// population is scheduled; until it lands the receiver shows an empty
    /// payload.
    pub fn observe_view(&self, key: ViewKey) -> watch::Receiver<ViewSnapshot> {
        let (rx, created) = self.views.observe(key.clone(), self.query());
        if created {
            debug!(view = %key, "Scheduling first population");
            self.scheduler.invalidate(key);
        }
        rx
    }

    /// Current snapshot of a registered view.
    pub fn view(&self, key: &ViewKey) -> Option<ViewSnapshot> {
        self.views.resolve(key)
    }

    /// Registers `key` if needed and refetches it right away.
    pub async fn refresh(&self, key: ViewKey) -> AppResult<ViewSnapshot> {
        self.views.get_or_create(key.clone(), self.query());
        self.scheduler.refetch(&key).await?;
        self.views
            .resolve(&key)
            .ok_or_else(|| AppError::not_found(format!("view {key} was closed during refresh")))
    }

    /// Refetches every stale view now instead of waiting for the window.
    pub async fn flush(&self) -> FlushSummary {
        self.scheduler.flush().await
    }

    /// Forgets a view. Open receivers see the channel close.
    pub fn close_view(&self, key: &ViewKey) -> bool {
        self.views.remove(key)
    }

    // ── Clipboard and selection ──────────────────────────────

    /// Current clipboard.
    pub fn clipboard(&self) -> Option<Clipboard> {
        self.ui.clipboard()
    }

    /// Replaces the clipboard.
    pub fn set_clipboard(&self, action: ClipboardAction, items: Vec<ClipboardItem>) {
        self.ui.set_clipboard(action, items);
    }

    /// Empties the clipboard.
    pub fn clear_clipboard(&self) {
        self.ui.clear();
    }

    /// Puts the selection on the clipboard for copying. Returns the number
    /// of items placed.
    pub fn copy_selection(&self) -> usize {
        self.fill_clipboard(ClipboardAction::Copy)
    }

    /// Puts the selection on the clipboard for moving.
    pub fn cut_selection(&self) -> usize {
        self.fill_clipboard(ClipboardAction::Cut)
    }

    /// Pastes the clipboard into `destination` (root when `None`).
    pub async fn paste(&self, destination: Option<EntityId>) -> AppResult<BulkOutcome> {
        clipboard::paste(&self.coordinator, &self.ui, destination).await
    }

    /// Trashes every selected entity and clears the selection.
    pub async fn delete_selection(&self) -> AppResult<BulkOutcome> {
        let selection = self.ui.selection();
        if selection.is_empty() {
            return Err(AppError::validation("nothing selected"));
        }
        self.ui.clear_selection();
        let descriptors = selection
            .ids()
            .iter()
            .cloned()
            .map(MutationDescriptor::delete)
            .collect::<Vec<_>>();
        Ok(self.submit_bulk(descriptors).await)
    }

    fn fill_clipboard(&self, action: ClipboardAction) -> usize {
        let items: Vec<ClipboardItem> = self
            .ui
            .selection()
            .ids()
            .iter()
            .filter_map(|id| self.store.get(id))
            .map(|entity| ClipboardItem::from(&entity))
            .collect();
        let placed = items.len();
        self.ui.set_clipboard(action, items);
        placed
    }

    /// Default query: recompute the view on the remote.
    fn query(&self) -> QueryFn {
        let remote = Arc::clone(&self.remote);
        Arc::new(move |key: ViewKey| {
            let remote = Arc::clone(&remote);
            async move { remote.fetch_view(&key).await }.boxed()
        })
    }
}
