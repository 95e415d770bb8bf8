//! Clipboard contents.

use serde::{Deserialize, Serialize};

use drivesync_entity::{Entity, EntityId, EntityKind};

/// What a paste does with the clipboard items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardAction {
    /// Paste duplicates the items; the clipboard survives.
    Copy,
    /// Paste moves the items; the clipboard clears once submitted.
    Cut,
}

/// One entity on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardItem {
    /// Folder or file.
    pub kind: EntityKind,
    /// The referenced entity.
    pub entity_id: EntityId,
}

impl From<&Entity> for ClipboardItem {
    fn from(entity: &Entity) -> Self {
        Self {
            kind: entity.kind(),
            entity_id: entity.id().clone(),
        }
    }
}

/// The copy/cut buffer. At most one is held at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clipboard {
    /// Copy or cut.
    pub action: ClipboardAction,
    /// Referenced entities, in selection order.
    pub items: Vec<ClipboardItem>,
}

impl Clipboard {
    /// Whether `id` is on the clipboard.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.items.iter().any(|item| &item.entity_id == id)
    }

    /// Whether the clipboard was filled by a cut.
    pub fn is_cut(&self) -> bool {
        self.action == ClipboardAction::Cut
    }
}
