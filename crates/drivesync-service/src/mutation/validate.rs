//! Tree rules checked before a mutation touches any state.

use drivesync_cache::EntityStore;
use drivesync_entity::{Entity, EntityId, EntityKind};

use super::descriptor::MutationKind;

/// Checks `kind` against the confirmed store. Returns the broken rule.
///
/// Placeholders are never in the store, so a mutation naming a temporary
/// id is refused as an unknown target.
pub(crate) fn validate(store: &EntityStore, kind: &MutationKind) -> Result<(), String> {
    match kind {
        MutationKind::CreateFolder { parent_id, name } => {
            require_name(name)?;
            require_destination(store, parent_id.as_ref())
        }
        MutationKind::Rename { target_id, name } => {
            require_name(name)?;
            require_target(store, target_id).map(|_| ())
        }
        MutationKind::Move {
            target_id,
            new_parent_id,
        }
        | MutationKind::Copy {
            target_id,
            new_parent_id,
        } => {
            let target = require_target(store, target_id)?;
            if !target.is_live() {
                return Err(format!("'{target_id}' is in the trash"));
            }
            if let Some(parent) = new_parent_id {
                if parent == target_id {
                    return Err(format!("'{target_id}' cannot be placed inside itself"));
                }
                if store.is_within(parent, target_id) {
                    return Err(format!(
                        "'{target_id}' cannot be placed inside its descendant '{parent}'"
                    ));
                }
            }
            require_destination(store, new_parent_id.as_ref())
        }
        MutationKind::Delete { target_id } => {
            let target = require_target(store, target_id)?;
            if !target.is_live() {
                return Err(format!("'{target_id}' is already in the trash"));
            }
            Ok(())
        }
        MutationKind::Restore { target_id } | MutationKind::PermanentDelete { target_id } => {
            let target = require_target(store, target_id)?;
            if target.is_live() {
                return Err(format!("'{target_id}' is not in the trash"));
            }
            Ok(())
        }
        MutationKind::Colorize { target_id, .. } => {
            let target = require_target(store, target_id)?;
            if target.kind() != EntityKind::Folder {
                return Err(format!("'{target_id}' is not a folder"));
            }
            Ok(())
        }
    }
}

fn require_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    Ok(())
}

fn require_target(store: &EntityStore, id: &EntityId) -> Result<Entity, String> {
    store.get(id).ok_or_else(|| format!("unknown target '{id}'"))
}

fn require_destination(store: &EntityStore, parent: Option<&EntityId>) -> Result<(), String> {
    let Some(parent) = parent else {
        return Ok(());
    };
    match store.get(parent) {
        Some(folder) if folder.kind() != EntityKind::Folder => {
            Err(format!("destination '{parent}' is not a folder"))
        }
        Some(folder) if !folder.is_live() => Err(format!("destination '{parent}' is in the trash")),
        Some(_) => Ok(()),
        None => Err(format!("unknown destination '{parent}'")),
    }
}
