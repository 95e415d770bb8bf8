//! Multi-select state.

use drivesync_entity::EntityId;

/// Selected entity ids, in the order they were selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<EntityId>,
    /// Last id toggled on, used as the start of shift-ranges.
    anchor: Option<EntityId>,
}

impl Selection {
    /// Flips `id` in or out of the selection. Returns whether it is now
    /// selected.
    pub fn toggle(&mut self, id: EntityId) -> bool {
        if let Some(pos) = self.ids.iter().position(|selected| selected == &id) {
            self.ids.remove(pos);
            if self.anchor.as_ref() == Some(&id) {
                self.anchor = None;
            }
            false
        } else {
            self.anchor = Some(id.clone());
            self.ids.push(id);
            true
        }
    }

    /// Replaces the selection with every id between `from` and `to`
    /// (inclusive, either direction) in `ordered`. An endpoint missing from
    /// `ordered` collapses the range to the other endpoint. Returns the
    /// number of ids selected.
    pub fn select_range(&mut self, from: &EntityId, to: &EntityId, ordered: &[EntityId]) -> usize {
        let start = ordered.iter().position(|id| id == from);
        let end = ordered.iter().position(|id| id == to);
        let range = match (start, end) {
            (Some(a), Some(b)) => &ordered[a.min(b)..=a.max(b)],
            (Some(i), None) | (None, Some(i)) => &ordered[i..=i],
            (None, None) => &[],
        };

        self.ids = range.to_vec();
        self.anchor = start.map(|_| from.clone());
        self.ids.len()
    }

    /// Replaces the selection with every id of `ordered`.
    pub fn select_all(&mut self, ordered: &[EntityId]) -> usize {
        self.ids = ordered.to_vec();
        self.anchor = self.ids.first().cloned();
        self.ids.len()
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.anchor = None;
    }

    /// Selected ids.
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// Start of the next shift-range.
    pub fn anchor(&self) -> Option<&EntityId> {
        self.anchor.as_ref()
    }

    /// Whether `id` is selected.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.ids.contains(id)
    }

    /// Number of selected ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
