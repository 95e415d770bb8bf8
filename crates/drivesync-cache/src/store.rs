//! Canonical entity storage.

use std::collections::HashSet;

use dashmap::DashMap;
use tracing::debug;

use drivesync_core::error::AppError;
use drivesync_core::result::AppResult;
use drivesync_entity::{Entity, EntityId};

/// Holds the confirmed state of every known entity, keyed by id.
///
/// Placeholders never enter the store; they live as display copies in
/// view rows until the server answers.
#[derive(Debug, Default)]
pub struct EntityStore {
    /// Entity id → entity.
    entities: DashMap<EntityId, Entity>,
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
        }
    }

    /// Inserts or replaces an entity by id. Returns the previous value.
    pub fn upsert(&self, entity: Entity) -> AppResult<Option<Entity>> {
        if entity.id().is_blank() {
            return Err(AppError::invariant_violation(format!(
                "refusing to store {} '{}' without an id",
                entity.kind(),
                entity.name()
            )));
        }
        if entity.is_optimistic() {
            return Err(AppError::invariant_violation(format!(
                "refusing to store optimistic placeholder '{}'",
                entity.id()
            )));
        }

        debug!(entity_id = %entity.id(), kind = %entity.kind(), "Entity upserted");
        Ok(self.entities.insert(entity.id().clone(), entity))
    }

    /// Hard-removes an entity. Used only after a confirmed permanent delete.
    pub fn remove(&self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id).map(|(_, entity)| entity)
    }

    /// Hard-removes an entity and everything beneath it. Returns the ids
    /// removed.
    pub fn remove_subtree(&self, id: &EntityId) -> Vec<EntityId> {
        let keys: Vec<EntityId> = self.entities.iter().map(|entry| entry.key().clone()).collect();
        let doomed: Vec<EntityId> = keys
            .into_iter()
            .filter(|candidate| self.is_within(candidate, id))
            .collect();
        for victim in &doomed {
            self.entities.remove(victim);
        }
        debug!(entity_id = %id, removed = doomed.len(), "Subtree removed");
        doomed
    }

    /// Gets a copy of an entity.
    pub fn get(&self, id: &EntityId) -> Option<Entity> {
        self.entities.get(id).map(|entry| entry.value().clone())
    }

    /// Whether an entity with this id is stored.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Applies `f` to a stored entity in place. Returns the updated copy.
    pub fn update<F>(&self, id: &EntityId, f: F) -> Option<Entity>
    where
        F: FnOnce(&mut Entity),
    {
        self.entities.get_mut(id).map(|mut entry| {
            f(entry.value_mut());
            entry.value().clone()
        })
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids of the ancestors of `id`, nearest first.
    ///
    /// Stops at the first parent the store does not know, and at the first
    /// repeated id so a corrupt parent chain cannot loop forever.
    pub fn ancestors(&self, id: &EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(id.clone());

        let mut current = self.get(id).and_then(|e| e.parent_id().cloned());
        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                break;
            }
            current = self.get(&parent).and_then(|e| e.parent_id().cloned());
            chain.push(parent);
        }
        chain
    }

    /// Whether `candidate` is `ancestor` itself or lies beneath it.
    pub fn is_within(&self, candidate: &EntityId, ancestor: &EntityId) -> bool {
        candidate == ancestor || self.ancestors(candidate).contains(ancestor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use drivesync_core::error::ErrorKind;
    use drivesync_entity::Folder;

    fn folder(id: &str, parent: Option<&str>) -> Entity {
        Folder::new(id, id.to_uppercase(), parent.map(EntityId::from)).into()
    }

    fn tree() -> EntityStore {
        // root ─ f-1 ─ f-2 ─ f-3
        //      └ f-9
        let store = EntityStore::new();
        store.upsert(folder("f-1", None)).expect("upsert");
        store.upsert(folder("f-2", Some("f-1"))).expect("upsert");
        store.upsert(folder("f-3", Some("f-2"))).expect("upsert");
        store.upsert(folder("f-9", None)).expect("upsert");
        store
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let store = EntityStore::new();
        assert!(store.upsert(folder("f-1", None)).expect("upsert").is_none());

        let renamed: Entity = Folder::new("f-1", "Renamed", None).into();
        let previous = store.upsert(renamed).expect("upsert");
        assert_eq!(previous.map(|e| e.name().to_string()), Some("F-1".into()));
        assert_eq!(store.get(&"f-1".into()).map(|e| e.name().to_string()), Some("Renamed".into()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_without_id_is_invariant_violation() {
        let store = EntityStore::new();
        let err = store.upsert(folder("", None)).expect_err("blank id");
        assert_eq!(err.kind, ErrorKind::InvariantViolation);
        assert!(store.is_empty());
    }

    #[test]
    fn test_upsert_rejects_placeholders() {
        let store = EntityStore::new();
        let placeholder = folder("f-1", None).into_placeholder("temp-1".into(), Utc::now());
        let err = store.upsert(placeholder).expect_err("placeholder");
        assert_eq!(err.kind, ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let store = tree();
        assert_eq!(
            store.ancestors(&"f-3".into()),
            vec![EntityId::from("f-2"), EntityId::from("f-1")]
        );
        assert!(store.ancestors(&"f-1".into()).is_empty());
        assert!(store.is_within(&"f-3".into(), &"f-1".into()));
        assert!(store.is_within(&"f-1".into(), &"f-1".into()));
        assert!(!store.is_within(&"f-9".into(), &"f-1".into()));
    }

    #[test]
    fn test_ancestors_survive_corrupt_cycle() {
        let store = EntityStore::new();
        store.upsert(folder("a", Some("b"))).expect("upsert");
        store.upsert(folder("b", Some("a"))).expect("upsert");
        assert_eq!(store.ancestors(&"a".into()), vec![EntityId::from("b")]);
    }

    #[test]
    fn test_remove_and_update() {
        let store = tree();
        let updated = store
            .update(&"f-9".into(), |e| e.set_deleted_at(Some(Utc::now())))
            .expect("present");
        assert!(!updated.is_live());

        assert!(store.remove(&"f-9".into()).is_some());
        assert!(!store.contains(&"f-9".into()));
        assert!(store.update(&"f-9".into(), |_| {}).is_none());
    }

    #[test]
    fn test_remove_subtree() {
        let store = tree();
        let mut removed = store.remove_subtree(&"f-2".into());
        removed.sort();
        assert_eq!(removed, vec![EntityId::from("f-2"), EntityId::from("f-3")]);
        assert_eq!(store.len(), 2);
    }
}
