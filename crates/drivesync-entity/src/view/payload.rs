//! View payloads: row lists or aggregate numbers.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};

/// One row of a list view.
///
/// Confirmed rows only reference the entity store. Rows whose state is
/// not yet confirmed (placeholders, in-flight renames or recolors) carry a
/// display copy, so the store is never written before the server answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "row", content = "data", rename_all = "lowercase")]
pub enum ViewRow {
    /// Reference to a confirmed entity in the store.
    Confirmed(EntityId),
    /// Display copy awaiting server confirmation.
    Pending(Entity),
}

impl ViewRow {
    /// The id this row stands for.
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Confirmed(id) => id,
            Self::Pending(entity) => entity.id(),
        }
    }

    /// Whether the row is a placeholder for an entity the server has not
    /// created yet.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Pending(entity) if entity.is_optimistic())
    }
}

/// Aggregate numbers served by the `stats` view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Live folders.
    pub folder_count: u64,
    /// Live files.
    pub file_count: u64,
    /// Bytes held by live files.
    pub total_bytes: u64,
    /// Soft-deleted entities.
    pub trashed_count: u64,
}

/// The cached payload of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ViewPayload {
    /// Ordered rows.
    Rows(Vec<ViewRow>),
    /// Aggregate numbers.
    Stats(StorageStats),
}

impl ViewPayload {
    /// Borrow the rows (empty for aggregate payloads).
    pub fn rows(&self) -> &[ViewRow] {
        match self {
            Self::Rows(rows) => rows,
            Self::Stats(_) => &[],
        }
    }

    /// Whether any row stands for `id`.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.rows().iter().any(|row| row.id() == id)
    }

    /// Insert a row at the head. No-op on aggregate payloads.
    pub fn insert_head(&mut self, row: ViewRow) {
        if let Self::Rows(rows) = self {
            rows.insert(0, row);
        }
    }

    /// Remove every row standing for `id`. Returns whether anything changed.
    pub fn remove(&mut self, id: &EntityId) -> bool {
        match self {
            Self::Rows(rows) => {
                let before = rows.len();
                rows.retain(|row| row.id() != id);
                rows.len() != before
            }
            Self::Stats(_) => false,
        }
    }

    /// Replace every row standing for `id` with `row`, keeping its position.
    pub fn replace(&mut self, id: &EntityId, row: ViewRow) -> bool {
        let mut changed = false;
        if let Self::Rows(rows) = self {
            for slot in rows.iter_mut().filter(|slot| slot.id() == id) {
                *slot = row.clone();
                changed = true;
            }
        }
        changed
    }

    /// Ids of every row, in order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.rows().iter().map(|row| row.id().clone()).collect()
    }

    /// Number of rows (0 for aggregate payloads).
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    /// Whether the payload has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

/// What the remote system answers for a view fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum FetchedView {
    /// Full entities, in the server's order.
    Entities(Vec<Entity>),
    /// Aggregate numbers.
    Stats(StorageStats),
}

impl FetchedView {
    /// Row count, for logging.
    pub fn len(&self) -> usize {
        match self {
            Self::Entities(entities) => entities.len(),
            Self::Stats(_) => 0,
        }
    }

    /// Whether the fetch returned no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
