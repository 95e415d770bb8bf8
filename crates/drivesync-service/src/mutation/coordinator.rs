//! Mutation coordinator: validate, snapshot, patch, call, then commit or
//! roll back.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use drivesync_cache::{EntityStore, ViewIndex, ViewSnapshotSet};
use drivesync_core::config::cache::CacheConfig;
use drivesync_core::error::AppError;
use drivesync_core::events::MutationEvent;
use drivesync_core::result::AppResult;
use drivesync_core::types::MutationId;
use drivesync_entity::{Entity, EntityId, EntityKind, ViewKey};

use super::bulk::BulkOutcome;
use super::descriptor::{MutationDescriptor, MutationKind};
use super::error::MutationError;
use super::projection::{self, Plan, Projector, TempIds};
use super::validate::validate;
use crate::events::EventBus;
use crate::invalidation::InvalidationScheduler;
use crate::remote::RemoteResourceApi;

/// A committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// The mutation id.
    pub mutation_id: MutationId,
    /// Kind label.
    pub label: &'static str,
    /// The server's copy of the created or changed entity, when the remote
    /// returns one.
    pub entity: Option<Entity>,
}

/// Applies mutations optimistically and reconciles them with the remote.
///
/// Every mutation runs the same pipeline: validate against the store,
/// snapshot the affected views, apply the optimistic patches, call the
/// remote, then either commit (store upsert, confirmed patches, stale
/// marks) or roll back.
#[derive(Debug, Clone)]
pub struct MutationCoordinator {
    store: Arc<EntityStore>,
    views: Arc<ViewIndex>,
    remote: Arc<dyn RemoteResourceApi>,
    scheduler: InvalidationScheduler,
    events: EventBus,
    temp_ids: Arc<TempIds>,
    copy_suffix: Arc<str>,
    /// Mutation id → kind label, for every submitted, unresolved mutation.
    in_flight: Arc<DashMap<MutationId, &'static str>>,
}

impl MutationCoordinator {
    /// Create a coordinator over shared cache state.
    pub fn new(
        views: Arc<ViewIndex>,
        remote: Arc<dyn RemoteResourceApi>,
        scheduler: InvalidationScheduler,
        events: EventBus,
        config: &CacheConfig,
    ) -> Self {
        Self {
            store: Arc::clone(views.store()),
            views,
            remote,
            scheduler,
            events,
            temp_ids: Arc::new(TempIds::new(config.temp_id_prefix.clone())),
            copy_suffix: Arc::from(config.copy_suffix.as_str()),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Number of submitted mutations that have not resolved yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Validates the descriptor and applies its optimistic effect.
    ///
    /// Nothing is sent to the remote until the returned handle is resolved.
    /// A rejected descriptor leaves every view untouched.
    pub fn submit(&self, descriptor: MutationDescriptor) -> Result<PendingMutation, MutationError> {
        let label = descriptor.label();
        let mutation_id = descriptor.id;

        if let Err(reason) = validate(&self.store, &descriptor.kind) {
            warn!(mutation_id = %mutation_id, kind = label, reason = %reason, "Mutation rejected");
            self.events.publish(MutationEvent::Rejected {
                mutation_id,
                kind: label.to_string(),
                reason: reason.clone(),
            });
            return Err(MutationError::InvalidOperation {
                mutation_id,
                label,
                reason,
            });
        }

        let plan = Projector {
            store: &self.store,
            views: &self.views,
            temp_ids: &self.temp_ids,
            copy_suffix: &self.copy_suffix,
        }
        .plan(&descriptor.kind, &descriptor.affected_view_keys);

        let snapshot = self.views.snapshot(&plan.affected);
        for (key, patch) in &plan.patches {
            self.views
                .apply_optimistic_patch(key, mutation_id, Arc::clone(patch));
        }
        self.in_flight.insert(mutation_id, label);

        debug!(
            mutation_id = %mutation_id,
            kind = label,
            affected = plan.affected.len(),
            patched = plan.patches.len(),
            "Mutation submitted"
        );
        self.events.publish(MutationEvent::Submitted {
            mutation_id,
            kind: label.to_string(),
            target_id: descriptor.target_id().map(ToString::to_string),
        });

        Ok(PendingMutation {
            coordinator: self.clone(),
            descriptor,
            plan,
            snapshot,
            settled: false,
        })
    }

    /// Submits and resolves one mutation.
    pub async fn execute(&self, descriptor: MutationDescriptor) -> Result<MutationOutcome, MutationError> {
        self.submit(descriptor)?.resolve().await
    }

    /// Submits every descriptor in order, then resolves them concurrently.
    ///
    /// Each item commits or rolls back on its own; one failure never
    /// undoes a sibling.
    pub async fn execute_bulk<I>(&self, descriptors: I) -> BulkOutcome
    where
        I: IntoIterator<Item = MutationDescriptor>,
    {
        let submitted: Vec<_> = descriptors
            .into_iter()
            .map(|descriptor| self.submit(descriptor))
            .collect();
        settle(submitted).await
    }

    fn invalidate(&self, keys: &[ViewKey]) {
        for key in keys {
            if self.views.mark_stale(key) {
                self.scheduler.schedule(key.clone());
            }
        }
    }
}

/// Resolves already-submitted mutations concurrently and sorts the
/// results, keeping submission order within each list.
pub(crate) async fn settle(submitted: Vec<Result<PendingMutation, MutationError>>) -> BulkOutcome {
    let resolved = join_all(submitted.into_iter().map(|item| async move {
        match item {
            Ok(mutation) => mutation.resolve().await,
            Err(err) => Err(err),
        }
    }))
    .await;

    let mut outcome = BulkOutcome::default();
    for result in resolved {
        match result {
            Ok(committed) => outcome.committed.push(committed),
            Err(err) => outcome.failed.push(err),
        }
    }

    if !outcome.is_complete() {
        warn!(
            committed = outcome.committed.len(),
            failed = outcome.failed.len(),
            "Bulk mutation partially failed"
        );
    }
    outcome
}

/// What the remote answered.
enum RemoteAnswer {
    Entity(Entity),
    Done,
}

/// A submitted mutation whose optimistic effect is on screen and whose
/// remote call has not been made.
///
/// Dropping it unresolved, or dropping the future of
/// [`resolve`](Self::resolve) before it completes, rolls it back.
pub struct PendingMutation {
    coordinator: MutationCoordinator,
    descriptor: MutationDescriptor,
    plan: Plan,
    snapshot: ViewSnapshotSet,
    settled: bool,
}

impl PendingMutation {
    /// The mutation id.
    pub fn id(&self) -> MutationId {
        self.descriptor.id
    }

    /// The submitted descriptor.
    pub fn descriptor(&self) -> &MutationDescriptor {
        &self.descriptor
    }

    /// Temporary id of the placeholder row, for creates and visible copies.
    pub fn placeholder_id(&self) -> Option<&EntityId> {
        self.plan.temp_id.as_ref()
    }

    /// Every view snapshotted for this mutation.
    pub fn affected_views(&self) -> &[ViewKey] {
        &self.plan.affected
    }

    /// Calls the remote and commits or rolls back.
    pub async fn resolve(mut self) -> Result<MutationOutcome, MutationError> {
        let answer = match self.call_remote().await {
            Ok(answer) => answer,
            Err(cause) => {
                self.roll_back(&cause.to_string());
                return Err(MutationError::Failed {
                    descriptor: Box::new(self.descriptor.clone()),
                    cause,
                });
            }
        };

        match self.commit(answer) {
            Ok(entity) => Ok(MutationOutcome {
                mutation_id: self.id(),
                label: self.descriptor.label(),
                entity,
            }),
            Err(cause) => {
                error!(
                    mutation_id = %self.id(),
                    kind = self.descriptor.label(),
                    error = %cause,
                    "Invariant violated while committing mutation"
                );
                self.abandon_overlays();
                Err(MutationError::InvariantViolation {
                    mutation_id: self.id(),
                    label: self.descriptor.label(),
                    cause,
                })
            }
        }
    }

    async fn call_remote(&self) -> AppResult<RemoteAnswer> {
        let remote = &self.coordinator.remote;
        let answer = match &self.descriptor.kind {
            MutationKind::CreateFolder { parent_id, name } => RemoteAnswer::Entity(
                remote
                    .create_folder(name.trim(), parent_id.as_ref())
                    .await?
                    .into(),
            ),
            MutationKind::Rename { target_id, name } => RemoteAnswer::Entity(
                remote
                    .rename_entity(self.target_kind()?, target_id, name.trim())
                    .await?,
            ),
            MutationKind::Move {
                target_id,
                new_parent_id,
            } => RemoteAnswer::Entity(
                remote
                    .move_entity(self.target_kind()?, target_id, new_parent_id.as_ref())
                    .await?,
            ),
            MutationKind::Copy {
                target_id,
                new_parent_id,
            } => RemoteAnswer::Entity(
                remote
                    .copy_entity(self.target_kind()?, target_id, new_parent_id.as_ref())
                    .await?,
            ),
            MutationKind::Delete { target_id } => {
                remote.soft_delete(self.target_kind()?, target_id).await?;
                RemoteAnswer::Done
            }
            MutationKind::Restore { target_id } => {
                remote.restore(self.target_kind()?, target_id).await?;
                RemoteAnswer::Done
            }
            MutationKind::PermanentDelete { target_id } => {
                remote.permanent_delete(self.target_kind()?, target_id).await?;
                RemoteAnswer::Done
            }
            MutationKind::Colorize { target_id, color } => {
                RemoteAnswer::Entity(remote.set_color(target_id, *color).await?.into())
            }
        };
        Ok(answer)
    }

    fn target_kind(&self) -> AppResult<EntityKind> {
        self.plan
            .target
            .as_ref()
            .map(Entity::kind)
            .ok_or_else(|| AppError::internal(format!("{} has no target", self.descriptor.label())))
    }

    /// Folds the server's answer into the store and views.
    fn commit(&mut self, answer: RemoteAnswer) -> AppResult<Option<Entity>> {
        let coordinator = &self.coordinator;
        let mutation_id = self.descriptor.id;

        let confirmed = match (&self.descriptor.kind, answer) {
            (_, RemoteAnswer::Entity(entity)) => {
                coordinator.store.upsert(entity.clone())?;
                Some(entity)
            }
            (MutationKind::Delete { target_id }, RemoteAnswer::Done) => {
                let at = Utc::now();
                coordinator
                    .store
                    .update(target_id, |e| e.set_deleted_at(Some(at)));
                None
            }
            (MutationKind::Restore { target_id }, RemoteAnswer::Done) => {
                coordinator.store.update(target_id, |e| e.set_deleted_at(None));
                None
            }
            (MutationKind::PermanentDelete { target_id }, RemoteAnswer::Done) => {
                coordinator.store.remove_subtree(target_id);
                None
            }
            (_, RemoteAnswer::Done) => None,
        };

        for (key, optimistic) in &self.plan.patches {
            let patch = match (&self.descriptor.kind, &confirmed, &self.plan.temp_id) {
                (
                    MutationKind::CreateFolder { .. } | MutationKind::Copy { .. },
                    Some(entity),
                    Some(temp_id),
                ) => projection::swap_placeholder(temp_id.clone(), entity.id().clone()),
                (
                    MutationKind::Rename { target_id, .. } | MutationKind::Colorize { target_id, .. },
                    _,
                    _,
                ) => projection::confirm_rows(target_id.clone()),
                _ => Arc::clone(optimistic),
            };
            coordinator.views.commit(key, mutation_id, patch);
        }
        if let Some(target_id) = self.descriptor.target_id() {
            coordinator.views.republish_containing(target_id);
        }
        if let Some(entity) = &confirmed {
            coordinator.views.republish_containing(entity.id());
        }

        coordinator.invalidate(&self.plan.affected);
        coordinator.in_flight.remove(&mutation_id);
        self.settled = true;

        info!(
            mutation_id = %mutation_id,
            kind = self.descriptor.label(),
            entity_id = ?confirmed.as_ref().map(|e| e.id().to_string()),
            "Mutation committed"
        );
        coordinator.events.publish(MutationEvent::Committed {
            mutation_id,
            kind: self.descriptor.label().to_string(),
        });
        Ok(confirmed)
    }

    /// Forgets this mutation's overlays and rebuilds the snapshotted views
    /// from their confirmed payloads.
    fn roll_back(&mut self, reason: &str) {
        let coordinator = &self.coordinator;
        let mutation_id = self.descriptor.id;

        coordinator.views.roll_back(&self.snapshot, mutation_id);
        coordinator.in_flight.remove(&mutation_id);
        self.settled = true;

        warn!(
            mutation_id = %mutation_id,
            kind = self.descriptor.label(),
            views = self.snapshot.len(),
            reason,
            "Mutation rolled back"
        );
        coordinator.events.publish(MutationEvent::RolledBack {
            mutation_id,
            kind: self.descriptor.label().to_string(),
            reason: reason.to_string(),
        });
    }

    /// Drops this mutation's overlays without touching payloads, and lets
    /// a refetch reconcile the views.
    fn abandon_overlays(&mut self) {
        let coordinator = &self.coordinator;
        for (key, _) in &self.plan.patches {
            coordinator.views.discard_overlay(key, self.descriptor.id);
        }
        coordinator.invalidate(&self.plan.affected);
        coordinator.in_flight.remove(&self.descriptor.id);
        self.settled = true;
    }
}

impl Drop for PendingMutation {
    fn drop(&mut self) {
        if !self.settled {
            self.roll_back("abandoned before the remote answered");
        }
    }
}

impl fmt::Debug for PendingMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMutation")
            .field("descriptor", &self.descriptor)
            .field("affected", &self.plan.affected)
            .field("placeholder", &self.plan.temp_id)
            .field("settled", &self.settled)
            .finish()
    }
}
