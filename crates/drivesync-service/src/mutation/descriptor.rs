//! Mutation descriptors: what to change, and which views care.

use serde::{Deserialize, Serialize};

use drivesync_core::types::MutationId;
use drivesync_entity::{ColorTag, EntityId, ViewKey};

/// The change a mutation requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationKind {
    /// Create a folder.
    CreateFolder {
        /// Containing folder, `None` for root.
        parent_id: Option<EntityId>,
        /// Display name.
        name: String,
    },
    /// Rename a folder or file.
    Rename {
        /// Entity to rename.
        target_id: EntityId,
        /// New display name.
        name: String,
    },
    /// Re-parent a folder or file.
    Move {
        /// Entity to move.
        target_id: EntityId,
        /// Destination folder, `None` for root.
        new_parent_id: Option<EntityId>,
    },
    /// Duplicate a folder or file.
    Copy {
        /// Entity to copy.
        target_id: EntityId,
        /// Destination folder, `None` for root.
        new_parent_id: Option<EntityId>,
    },
    /// Move to the trash.
    Delete {
        /// Entity to trash.
        target_id: EntityId,
    },
    /// Bring back from the trash.
    Restore {
        /// Trashed entity.
        target_id: EntityId,
    },
    /// Set or clear a folder's color label.
    Colorize {
        /// Folder to label.
        target_id: EntityId,
        /// New label, `None` to clear.
        color: Option<ColorTag>,
    },
    /// Delete a trashed entity for good.
    PermanentDelete {
        /// Trashed entity.
        target_id: EntityId,
    },
}

impl MutationKind {
    /// Short label used in logs and events.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateFolder { .. } => "create_folder",
            Self::Rename { .. } => "rename",
            Self::Move { .. } => "move",
            Self::Copy { .. } => "copy",
            Self::Delete { .. } => "delete",
            Self::Restore { .. } => "restore",
            Self::Colorize { .. } => "colorize",
            Self::PermanentDelete { .. } => "permanent_delete",
        }
    }

    /// The existing entity the mutation acts on. `None` for creates.
    pub fn target_id(&self) -> Option<&EntityId> {
        match self {
            Self::CreateFolder { .. } => None,
            Self::Rename { target_id, .. }
            | Self::Move { target_id, .. }
            | Self::Copy { target_id, .. }
            | Self::Delete { target_id }
            | Self::Restore { target_id }
            | Self::Colorize { target_id, .. }
            | Self::PermanentDelete { target_id } => Some(target_id),
        }
    }
}

/// A single requested change plus the views it declares as affected.
///
/// The coordinator widens `affected_view_keys` with every view it can
/// derive from the store (the target's current views, source and
/// destination listings, trash, stats), so callers only list views the
/// coordinator cannot know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationDescriptor {
    /// Unique mutation id.
    pub id: MutationId,
    /// What to change.
    #[serde(flatten)]
    pub kind: MutationKind,
    /// Extra views to snapshot and invalidate.
    #[serde(default)]
    pub affected_view_keys: Vec<ViewKey>,
}

impl MutationDescriptor {
    /// Wrap a kind with a fresh id.
    pub fn new(kind: MutationKind) -> Self {
        Self {
            id: MutationId::new(),
            kind,
            affected_view_keys: Vec::new(),
        }
    }

    /// Create a folder under `parent_id`.
    pub fn create_folder(parent_id: Option<EntityId>, name: impl Into<String>) -> Self {
        Self::new(MutationKind::CreateFolder {
            parent_id,
            name: name.into(),
        })
    }

    /// Rename `target_id`.
    pub fn rename(target_id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self::new(MutationKind::Rename {
            target_id: target_id.into(),
            name: name.into(),
        })
    }

    /// Move `target_id` under `new_parent_id`.
    pub fn move_to(target_id: impl Into<EntityId>, new_parent_id: Option<EntityId>) -> Self {
        Self::new(MutationKind::Move {
            target_id: target_id.into(),
            new_parent_id,
        })
    }

    /// Copy `target_id` under `new_parent_id`.
    pub fn copy_to(target_id: impl Into<EntityId>, new_parent_id: Option<EntityId>) -> Self {
        Self::new(MutationKind::Copy {
            target_id: target_id.into(),
            new_parent_id,
        })
    }

    /// Move `target_id` to the trash.
    pub fn delete(target_id: impl Into<EntityId>) -> Self {
        Self::new(MutationKind::Delete {
            target_id: target_id.into(),
        })
    }

    /// Restore `target_id` from the trash.
    pub fn restore(target_id: impl Into<EntityId>) -> Self {
        Self::new(MutationKind::Restore {
            target_id: target_id.into(),
        })
    }

    /// Label folder `target_id`.
    pub fn colorize(target_id: impl Into<EntityId>, color: Option<ColorTag>) -> Self {
        Self::new(MutationKind::Colorize {
            target_id: target_id.into(),
            color,
        })
    }

    /// Purge trashed `target_id`.
    pub fn permanent_delete(target_id: impl Into<EntityId>) -> Self {
        Self::new(MutationKind::PermanentDelete {
            target_id: target_id.into(),
        })
    }

    /// Declare extra affected views.
    pub fn with_views(mut self, keys: impl IntoIterator<Item = ViewKey>) -> Self {
        self.affected_view_keys.extend(keys);
        self
    }

    /// Short label of the kind.
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    /// The existing entity acted on.
    pub fn target_id(&self) -> Option<&EntityId> {
        self.kind.target_id()
    }
}
