//! Paste: turn the clipboard into move or copy mutations.

use tracing::info;

use drivesync_core::error::AppError;
use drivesync_core::result::AppResult;
use drivesync_entity::EntityId;

use super::UiState;
use super::state::ClipboardAction;
use crate::mutation::{BulkOutcome, MutationCoordinator, MutationDescriptor, settle};

/// Pastes the clipboard into `destination` (root when `None`).
///
/// Submits one `move` (cut) or `copy` mutation per item. A cut clipboard
/// is cleared as soon as at least one item is submitted, before any remote
/// call resolves; a copy clipboard is kept for the next paste.
pub async fn paste(
    coordinator: &MutationCoordinator,
    ui: &UiState,
    destination: Option<EntityId>,
) -> AppResult<BulkOutcome> {
    let Some(clipboard) = ui.clipboard() else {
        return Err(AppError::validation("nothing to paste"));
    };

    let submitted: Vec<_> = clipboard
        .items
        .iter()
        .map(|item| {
            let descriptor = match clipboard.action {
                ClipboardAction::Cut => {
                    MutationDescriptor::move_to(item.entity_id.clone(), destination.clone())
                }
                ClipboardAction::Copy => {
                    MutationDescriptor::copy_to(item.entity_id.clone(), destination.clone())
                }
            };
            coordinator.submit(descriptor)
        })
        .collect();

    let accepted = submitted.iter().filter(|item| item.is_ok()).count();
    if clipboard.is_cut() && accepted > 0 {
        ui.clear();
    }
    info!(
        action = ?clipboard.action,
        destination = ?destination,
        items = clipboard.items.len(),
        accepted,
        "Paste submitted"
    );

    Ok(settle(submitted).await)
}
