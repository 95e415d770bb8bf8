//! Optimistic projection: which views a mutation touches and how.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use drivesync_cache::{EntityStore, PatchFn, ViewIndex};
use drivesync_entity::{Entity, EntityId, Folder, ViewKey, ViewPayload, ViewRow};

use super::descriptor::MutationKind;

/// Mints placeholder ids: `temp-1`, `temp-2`, ...
#[derive(Debug)]
pub(crate) struct TempIds {
    prefix: String,
    next: AtomicU64,
}

impl TempIds {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }

    pub(crate) fn next(&self) -> EntityId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        EntityId::new(format!("{}-{n}", self.prefix))
    }
}

/// Everything the coordinator decided at submission time.
#[derive(Default)]
pub(crate) struct Plan {
    /// Views to snapshot before patching and invalidate on commit.
    pub(crate) affected: Vec<ViewKey>,
    /// Optimistic overlays, one per patched view.
    pub(crate) patches: Vec<(ViewKey, PatchFn)>,
    /// Placeholder id, for creates and visible copies.
    pub(crate) temp_id: Option<EntityId>,
    /// Store copy of the target at submission time.
    pub(crate) target: Option<Entity>,
}

impl Plan {
    fn affect(&mut self, key: ViewKey) {
        if !self.affected.contains(&key) {
            self.affected.push(key);
        }
    }

    fn affect_all(&mut self, keys: impl IntoIterator<Item = ViewKey>) {
        for key in keys {
            self.affect(key);
        }
    }

    fn patch(&mut self, key: ViewKey, patch: PatchFn) {
        self.affect(key.clone());
        self.patches.push((key, patch));
    }

    /// Views a newly live or newly trashed file moves in or out of.
    fn affect_file_views(&mut self, entity: &Entity) {
        if let Some(file) = entity.as_file() {
            self.affect(ViewKey::Recent);
            self.affect(ViewKey::Category(file.category()));
        }
    }
}

/// Builds [`Plan`]s against the current store and view index.
pub(crate) struct Projector<'a> {
    pub(crate) store: &'a EntityStore,
    pub(crate) views: &'a ViewIndex,
    pub(crate) temp_ids: &'a TempIds,
    pub(crate) copy_suffix: &'a str,
}

impl Projector<'_> {
    /// Plans a mutation that already passed validation.
    pub(crate) fn plan(&self, kind: &MutationKind, declared: &[ViewKey]) -> Plan {
        let mut plan = Plan {
            target: kind.target_id().and_then(|id| self.store.get(id)),
            ..Plan::default()
        };

        match kind {
            MutationKind::CreateFolder { parent_id, name } => {
                let temp_id = self.temp_ids.next();
                let placeholder = Entity::from(Folder::new(
                    temp_id.clone(),
                    name.trim(),
                    parent_id.clone(),
                ))
                .into_placeholder(temp_id.clone(), Utc::now());

                plan.patch(
                    ViewKey::contents(parent_id.as_ref()),
                    insert_head(ViewRow::Pending(placeholder)),
                );
                // The parent's child count changes in its own listing.
                if let Some(parent) = parent_id.as_ref().and_then(|id| self.store.get(id)) {
                    plan.affect(ViewKey::contents(parent.parent_id()));
                }
                plan.affect(ViewKey::Stats);
                plan.temp_id = Some(temp_id);
            }

            MutationKind::Rename { target_id, name } => {
                if let Some(target) = plan.target.clone() {
                    let mut renamed = target.clone();
                    renamed.set_name(name.trim(), Utc::now());
                    self.patch_containing(&mut plan, target_id, || {
                        replace_rows(target_id.clone(), renamed.clone())
                    });
                    plan.affect(ViewKey::contents(target.parent_id()));
                }
            }

            MutationKind::Colorize { target_id, color } => {
                if let Some(target) = plan.target.clone() {
                    let mut colored = target.clone();
                    if let Entity::Folder(folder) = &mut colored {
                        folder.color_tag = *color;
                        folder.updated_at = Utc::now();
                    }
                    self.patch_containing(&mut plan, target_id, || {
                        replace_rows(target_id.clone(), colored.clone())
                    });
                }
            }

            MutationKind::Move {
                target_id,
                new_parent_id,
            } => {
                if let Some(target) = plan.target.clone() {
                    let source = ViewKey::contents(target.parent_id());
                    let destination = ViewKey::contents(new_parent_id.as_ref());
                    if source != destination {
                        plan.patch(source, remove_rows([target_id.clone()]));
                    }
                    plan.affect(destination);
                    plan.affect_all(self.views.keys_containing(target_id));
                }
            }

            MutationKind::Copy {
                target_id: _,
                new_parent_id,
            } => {
                if let Some(target) = plan.target.clone() {
                    let destination = ViewKey::contents(new_parent_id.as_ref());
                    // Only a visible destination gets a placeholder row.
                    if self.views.is_registered(&destination) {
                        let temp_id = self.temp_ids.next();
                        let now = Utc::now();
                        let mut placeholder = target.clone().into_placeholder(temp_id.clone(), now);
                        placeholder.set_name(format!("{}{}", target.name(), self.copy_suffix), now);
                        placeholder.set_parent(new_parent_id.clone(), now);
                        plan.patch(destination, insert_head(ViewRow::Pending(placeholder)));
                        plan.temp_id = Some(temp_id);
                    } else {
                        plan.affect(destination);
                    }
                    plan.affect_file_views(&target);
                    plan.affect(ViewKey::Stats);
                }
            }

            MutationKind::Delete { target_id } => {
                if let Some(target) = plan.target.clone() {
                    // Trashing a folder hides everything beneath it too.
                    for key in self.views.keys().into_iter().filter(ViewKey::is_live) {
                        let hidden: Vec<EntityId> = self
                            .views
                            .payload(&key)
                            .map(|payload| payload.ids())
                            .unwrap_or_default()
                            .into_iter()
                            .filter(|id| self.store.is_within(id, target_id))
                            .collect();
                        if !hidden.is_empty() {
                            plan.patch(key, remove_rows(hidden));
                        }
                    }
                    plan.affect(ViewKey::contents(target.parent_id()));
                    plan.affect_file_views(&target);
                    plan.affect_all([ViewKey::Trash, ViewKey::Stats]);
                }
            }

            MutationKind::Restore { target_id } => {
                if let Some(target) = plan.target.clone() {
                    // No optimistic effect: the server picks the destination.
                    plan.affect(ViewKey::Trash);
                    plan.affect(ViewKey::contents(target.parent_id()));
                    plan.affect(ViewKey::root());
                    plan.affect_file_views(&target);
                    plan.affect(ViewKey::Stats);
                    plan.affect_all(self.views.keys_containing(target_id));
                }
            }

            MutationKind::PermanentDelete { target_id } => {
                plan.patch(ViewKey::Trash, remove_rows([target_id.clone()]));
                plan.affect(ViewKey::Stats);
                plan.affect_all(self.views.keys_containing(target_id));
            }
        }

        plan.affect_all(declared.iter().cloned());
        plan
    }

    /// Patches every view that currently shows `id`.
    fn patch_containing<F>(&self, plan: &mut Plan, id: &EntityId, make: F)
    where
        F: Fn() -> PatchFn,
    {
        for key in self.views.keys_containing(id) {
            plan.patch(key, make());
        }
    }
}

/// Puts `row` at the head unless a row with its id is already there.
pub(crate) fn insert_head(row: ViewRow) -> PatchFn {
    Arc::new(move |payload: &mut ViewPayload| {
        if !payload.contains(row.id()) {
            payload.insert_head(row.clone());
        }
    })
}

/// Removes the rows of every id in `ids`.
pub(crate) fn remove_rows(ids: impl IntoIterator<Item = EntityId>) -> PatchFn {
    let ids: HashSet<EntityId> = ids.into_iter().collect();
    Arc::new(move |payload: &mut ViewPayload| {
        if let ViewPayload::Rows(rows) = payload {
            rows.retain(|row| !ids.contains(row.id()));
        }
    })
}

/// Shows `entity` in place of the confirmed row for `id`.
pub(crate) fn replace_rows(id: EntityId, entity: Entity) -> PatchFn {
    Arc::new(move |payload: &mut ViewPayload| {
        payload.replace(&id, ViewRow::Pending(entity.clone()));
    })
}

/// Turns display copies of `id` back into references to the store.
pub(crate) fn confirm_rows(id: EntityId) -> PatchFn {
    Arc::new(move |payload: &mut ViewPayload| {
        if let ViewPayload::Rows(rows) = payload {
            for row in rows.iter_mut() {
                if matches!(row, ViewRow::Pending(entity) if entity.id() == &id && !entity.is_optimistic())
                {
                    *row = ViewRow::Confirmed(id.clone());
                }
            }
        }
    })
}

/// Replaces placeholder `temp_id` with the confirmed entity `real_id`.
/// If a refetch already brought `real_id` in, the placeholder is dropped;
/// if the placeholder is gone, the confirmed row goes to the head.
pub(crate) fn swap_placeholder(temp_id: EntityId, real_id: EntityId) -> PatchFn {
    Arc::new(move |payload: &mut ViewPayload| {
        if payload.contains(&real_id) {
            payload.remove(&temp_id);
        } else if !payload.replace(&temp_id, ViewRow::Confirmed(real_id.clone())) {
            payload.insert_head(ViewRow::Confirmed(real_id.clone()));
        }
    })
}
