//! Clipboard and selection: transient UI state that mutations read but
//! never own.
//!
//! [`UiState`] is created once at the application root and handed by
//! reference to whatever needs it. It never touches the entity store.

pub mod paste;
pub mod selection;
pub mod state;

use std::sync::Mutex;

use tracing::debug;

use drivesync_entity::EntityId;

use crate::sync::lock;

pub use paste::paste;
pub use selection::Selection;
pub use state::{Clipboard, ClipboardAction, ClipboardItem};

/// Process-lifetime holder of the clipboard and the selection.
#[derive(Debug, Default)]
pub struct UiState {
    clipboard: Mutex<Option<Clipboard>>,
    selection: Mutex<Selection>,
}

impl UiState {
    /// Create empty UI state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the clipboard. An empty item list clears it.
    pub fn set_clipboard(&self, action: ClipboardAction, items: Vec<ClipboardItem>) {
        let mut clipboard = lock(&self.clipboard);
        if items.is_empty() {
            *clipboard = None;
            return;
        }
        debug!(?action, items = items.len(), "Clipboard set");
        *clipboard = Some(Clipboard { action, items });
    }

    /// Empties the clipboard.
    pub fn clear(&self) {
        *lock(&self.clipboard) = None;
    }

    /// Current clipboard, if any.
    pub fn clipboard(&self) -> Option<Clipboard> {
        lock(&self.clipboard).clone()
    }

    /// Flips `id` in or out of the selection. Returns whether it is now
    /// selected.
    pub fn toggle_select(&self, id: impl Into<EntityId>) -> bool {
        lock(&self.selection).toggle(id.into())
    }

    /// Replaces the selection with the range `from..=to` of `ordered`.
    pub fn select_range(&self, from: &EntityId, to: &EntityId, ordered: &[EntityId]) -> usize {
        lock(&self.selection).select_range(from, to, ordered)
    }

    /// Selects every id of `ordered`.
    pub fn select_all(&self, ordered: &[EntityId]) -> usize {
        lock(&self.selection).select_all(ordered)
    }

    /// Deselects everything.
    pub fn clear_selection(&self) {
        lock(&self.selection).clear();
    }

    /// Copy of the current selection.
    pub fn selection(&self) -> Selection {
        lock(&self.selection).clone()
    }

    /// Whether `id` is selected.
    pub fn is_selected(&self, id: &EntityId) -> bool {
        lock(&self.selection).contains(id)
    }
}
