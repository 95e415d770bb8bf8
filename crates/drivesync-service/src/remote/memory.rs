//! In-process remote backed by a hash map, for the demo binary and tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use drivesync_core::error::AppError;
use drivesync_core::result::AppResult;
use drivesync_entity::{
    ColorTag, Entity, EntityId, EntityKind, FetchedView, Folder, StorageStats, ViewKey,
};

use super::RemoteResourceApi;
use crate::sync::lock;

const DEFAULT_RECENT_LIMIT: usize = 20;
const DEFAULT_COPY_SUFFIX: &str = " (Copy)";

/// Remote operations, used for call counting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    /// `create_folder`.
    CreateFolder,
    /// `rename_entity`.
    Rename,
    /// `move_entity`.
    Move,
    /// `copy_entity`.
    Copy,
    /// `soft_delete`.
    SoftDelete,
    /// `restore`.
    Restore,
    /// `permanent_delete`.
    PermanentDelete,
    /// `set_color`.
    SetColor,
    /// `fetch_view`.
    FetchView,
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateFolder => "create_folder",
            Self::Rename => "rename_entity",
            Self::Move => "move_entity",
            Self::Copy => "copy_entity",
            Self::SoftDelete => "soft_delete",
            Self::Restore => "restore",
            Self::PermanentDelete => "permanent_delete",
            Self::SetColor => "set_color",
            Self::FetchView => "fetch_view",
        };
        f.write_str(name)
    }
}

/// Authoritative server state.
#[derive(Debug)]
struct ServerState {
    entities: HashMap<EntityId, Entity>,
    next_folder: u64,
    next_file: u64,
}

/// Injected failures.
#[derive(Debug, Default)]
struct Faults {
    /// Op → remaining forced failures.
    pending: HashMap<RemoteOp, usize>,
    /// Entities whose every mutation fails.
    poisoned: HashSet<EntityId>,
    /// Fail everything.
    offline: bool,
}

/// A remote system kept entirely in memory.
///
/// Ids are minted as `f-N` for folders and `file-N` for files. Folder
/// counts and sizes are computed on read, the way a server would
/// aggregate them.
#[derive(Debug)]
pub struct MemoryRemote {
    state: Mutex<ServerState>,
    faults: Mutex<Faults>,
    calls: Mutex<HashMap<RemoteOp, usize>>,
    fetches: Mutex<HashMap<ViewKey, usize>>,
    latency: Option<Duration>,
    recent_limit: usize,
    copy_suffix: String,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// Create an empty remote.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServerState {
                entities: HashMap::new(),
                next_folder: 1,
                next_file: 1,
            }),
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(HashMap::new()),
            fetches: Mutex::new(HashMap::new()),
            latency: None,
            recent_limit: DEFAULT_RECENT_LIMIT,
            copy_suffix: DEFAULT_COPY_SUFFIX.to_string(),
        }
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Cap the `recent` view at `limit` rows.
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    /// Suffix appended to the names of copies.
    pub fn with_copy_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.copy_suffix = suffix.into();
        self
    }

    /// Insert or replace an entity directly, bypassing every check.
    pub fn seed(&self, entity: impl Into<Entity>) {
        let entity = entity.into();
        lock(&self.state).entities.insert(entity.id().clone(), entity);
    }

    /// Numbers the next minted folder and file ids.
    pub fn set_next_ids(&self, folder: u64, file: u64) {
        let mut state = lock(&self.state);
        state.next_folder = folder;
        state.next_file = file;
    }

    /// Server-side copy of an entity, with aggregates filled in.
    pub fn entity(&self, id: &EntityId) -> Option<Entity> {
        let state = lock(&self.state);
        state.entities.get(id).map(|e| state.decorate(e))
    }

    /// Number of stored entities, trashed ones included.
    pub fn len(&self) -> usize {
        lock(&self.state).entities.len()
    }

    /// Whether the remote holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next call to `op` fail with a transport error.
    pub fn fail_next(&self, op: RemoteOp) {
        self.fail_times(op, 1);
    }

    /// Make the next `times` calls to `op` fail.
    pub fn fail_times(&self, op: RemoteOp, times: usize) {
        *lock(&self.faults).pending.entry(op).or_default() += times;
    }

    /// Make every mutation targeting `id` fail.
    pub fn poison(&self, id: impl Into<EntityId>) {
        lock(&self.faults).poisoned.insert(id.into());
    }

    /// Fail every call while `offline` is set.
    pub fn set_offline(&self, offline: bool) {
        lock(&self.faults).offline = offline;
    }

    /// Clear every injected fault.
    pub fn heal(&self) {
        *lock(&self.faults) = Faults::default();
    }

    /// How many times `op` was called, failures included.
    pub fn call_count(&self, op: RemoteOp) -> usize {
        lock(&self.calls).get(&op).copied().unwrap_or(0)
    }

    /// How many times `key` was fetched, failures included.
    pub fn fetch_count(&self, key: &ViewKey) -> usize {
        lock(&self.fetches).get(key).copied().unwrap_or(0)
    }

    /// Counts the call, waits out the configured latency, then applies
    /// injected faults.
    async fn begin(&self, op: RemoteOp, target: Option<&EntityId>) -> AppResult<()> {
        *lock(&self.calls).entry(op).or_default() += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut faults = lock(&self.faults);
        if faults.offline {
            return Err(AppError::transport(format!("{op}: remote unreachable")));
        }
        if let Some(remaining) = faults.pending.get_mut(&op).filter(|n| **n > 0) {
            *remaining -= 1;
            return Err(AppError::transport(format!("{op}: injected failure")));
        }
        if let Some(id) = target.filter(|id| faults.poisoned.contains(*id)) {
            return Err(AppError::transport(format!("{op}: injected failure for '{id}'")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteResourceApi for MemoryRemote {
    async fn create_folder(&self, name: &str, parent_id: Option<&EntityId>) -> AppResult<Folder> {
        self.begin(RemoteOp::CreateFolder, parent_id).await?;
        let name = valid_name(name)?;

        let mut state = lock(&self.state);
        state.require_live_folder(parent_id)?;
        let id = state.mint(EntityKind::Folder);
        let folder = Folder::new(id.clone(), name, parent_id.cloned());
        state.entities.insert(id.clone(), folder.clone().into());

        debug!(folder_id = %id, "Remote created folder");
        Ok(folder)
    }

    async fn rename_entity(&self, kind: EntityKind, id: &EntityId, name: &str) -> AppResult<Entity> {
        self.begin(RemoteOp::Rename, Some(id)).await?;
        let name = valid_name(name)?;

        let mut state = lock(&self.state);
        let entity = state.get_mut(kind, id)?;
        entity.set_name(name, Utc::now());
        let renamed = entity.clone();
        Ok(state.decorate(&renamed))
    }

    async fn move_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
        new_parent_id: Option<&EntityId>,
    ) -> AppResult<Entity> {
        self.begin(RemoteOp::Move, Some(id)).await?;

        let mut state = lock(&self.state);
        state.get_mut(kind, id)?;
        state.require_live_folder(new_parent_id)?;
        if let Some(parent) = new_parent_id
            && state.is_within(parent, id)
        {
            return Err(AppError::invalid_operation(format!(
                "cannot move '{id}' into itself or its descendant '{parent}'"
            )));
        }

        let entity = state.get_mut(kind, id)?;
        entity.set_parent(new_parent_id.cloned(), Utc::now());
        let moved = entity.clone();
        Ok(state.decorate(&moved))
    }

    async fn copy_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
        new_parent_id: Option<&EntityId>,
    ) -> AppResult<Entity> {
        self.begin(RemoteOp::Copy, Some(id)).await?;

        let mut state = lock(&self.state);
        let source = state.get_mut(kind, id)?.clone();
        if !source.is_live() {
            return Err(AppError::invalid_operation(format!("'{id}' is in the trash")));
        }
        state.require_live_folder(new_parent_id)?;
        if let Some(parent) = new_parent_id
            && state.is_within(parent, id)
        {
            return Err(AppError::invalid_operation(format!(
                "cannot copy '{id}' into itself or its descendant '{parent}'"
            )));
        }

        let name = format!("{}{}", source.name(), self.copy_suffix);
        let top = state.duplicate(&source, new_parent_id.cloned(), name);

        // Children keep their names; only the top-level copy is suffixed.
        let mut queue = VecDeque::from([(source.id().clone(), top.clone())]);
        while let Some((original, copy)) = queue.pop_front() {
            let children: Vec<Entity> = state
                .entities
                .values()
                .filter(|e| e.is_live() && e.parent_id() == Some(&original))
                .cloned()
                .collect();
            for child in children {
                let name = child.name().to_string();
                let child_copy = state.duplicate(&child, Some(copy.clone()), name);
                if child.kind() == EntityKind::Folder {
                    queue.push_back((child.id().clone(), child_copy));
                }
            }
        }

        debug!(source_id = %id, copy_id = %top, "Remote copied entity");
        let copied = state
            .entities
            .get(&top)
            .cloned()
            .ok_or_else(|| AppError::internal(format!("copy '{top}' vanished")))?;
        Ok(state.decorate(&copied))
    }

    async fn soft_delete(&self, kind: EntityKind, id: &EntityId) -> AppResult<()> {
        self.begin(RemoteOp::SoftDelete, Some(id)).await?;

        let mut state = lock(&self.state);
        let entity = state.get_mut(kind, id)?;
        if !entity.is_live() {
            return Err(AppError::invalid_operation(format!("'{id}' is already in the trash")));
        }
        entity.set_deleted_at(Some(Utc::now()));
        Ok(())
    }

    async fn restore(&self, kind: EntityKind, id: &EntityId) -> AppResult<()> {
        self.begin(RemoteOp::Restore, Some(id)).await?;

        let mut state = lock(&self.state);
        let parent_gone = {
            let entity = state.get_mut(kind, id)?;
            if entity.is_live() {
                return Err(AppError::invalid_operation(format!("'{id}' is not in the trash")));
            }
            entity.parent_id().cloned()
        }
        .is_some_and(|parent| !state.is_reachable(&parent));

        let entity = state.get_mut(kind, id)?;
        entity.set_deleted_at(None);
        if parent_gone {
            // The original folder is trashed or gone; restore to root.
            debug!(entity_id = %id, "Restoring to root");
            entity.set_parent(None, Utc::now());
        }
        Ok(())
    }

    async fn permanent_delete(&self, kind: EntityKind, id: &EntityId) -> AppResult<()> {
        self.begin(RemoteOp::PermanentDelete, Some(id)).await?;

        let mut state = lock(&self.state);
        if state.get_mut(kind, id)?.is_live() {
            return Err(AppError::invalid_operation(format!(
                "'{id}' must be in the trash before it can be deleted permanently"
            )));
        }
        let doomed: Vec<EntityId> = state
            .entities
            .keys()
            .filter(|candidate| state.is_within(candidate, id))
            .cloned()
            .collect();
        for victim in &doomed {
            state.entities.remove(victim);
        }
        debug!(entity_id = %id, removed = doomed.len(), "Remote purged entity");
        Ok(())
    }

    async fn set_color(&self, id: &EntityId, color: Option<ColorTag>) -> AppResult<Folder> {
        self.begin(RemoteOp::SetColor, Some(id)).await?;

        let mut state = lock(&self.state);
        let Entity::Folder(folder) = state.get_mut(EntityKind::Folder, id)? else {
            return Err(AppError::invalid_operation(format!("'{id}' is not a folder")));
        };
        folder.color_tag = color;
        folder.updated_at = Utc::now();
        let colored = Entity::Folder(folder.clone());
        match state.decorate(&colored) {
            Entity::Folder(folder) => Ok(folder),
            Entity::File(_) => Err(AppError::internal(format!("'{id}' changed kind"))),
        }
    }

    async fn fetch_view(&self, key: &ViewKey) -> AppResult<FetchedView> {
        *lock(&self.fetches).entry(key.clone()).or_default() += 1;
        self.begin(RemoteOp::FetchView, None).await?;

        let state = lock(&self.state);
        if let ViewKey::Contents(Some(folder)) = key
            && !state.is_reachable(folder)
        {
            return Err(AppError::not_found(format!("folder '{folder}' not found")));
        }

        let view = match key {
            ViewKey::Stats => FetchedView::Stats(state.stats()),
            ViewKey::Trash => {
                let mut rows: Vec<Entity> = state
                    .entities
                    .values()
                    .filter(|e| key.admits(e))
                    .map(|e| state.decorate(e))
                    .collect();
                rows.sort_by_key(|e| std::cmp::Reverse(e.deleted_at()));
                FetchedView::Entities(rows)
            }
            ViewKey::Contents(_) => {
                let mut rows = state.reachable(|e| key.admits(e));
                rows.sort_by(|a, b| {
                    (a.kind() != EntityKind::Folder)
                        .cmp(&(b.kind() != EntityKind::Folder))
                        .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
                });
                FetchedView::Entities(rows)
            }
            ViewKey::Recent => {
                let mut rows = state.reachable(|e| key.admits(e));
                rows.sort_by_key(|e| std::cmp::Reverse(e.updated_at()));
                rows.truncate(self.recent_limit);
                FetchedView::Entities(rows)
            }
            ViewKey::Category(_) => {
                let mut rows = state.reachable(|e| key.admits(e));
                rows.sort_by_key(|e| e.name().to_lowercase());
                FetchedView::Entities(rows)
            }
        };
        Ok(view)
    }
}

impl ServerState {
    fn get_mut(&mut self, kind: EntityKind, id: &EntityId) -> AppResult<&mut Entity> {
        self.entities
            .get_mut(id)
            .filter(|e| e.kind() == kind)
            .ok_or_else(|| AppError::not_found(format!("{kind} '{id}' not found")))
    }

    fn require_live_folder(&self, id: Option<&EntityId>) -> AppResult<()> {
        let Some(id) = id else {
            return Ok(());
        };
        match self.entities.get(id) {
            Some(Entity::Folder(_)) if self.is_reachable(id) => Ok(()),
            Some(Entity::Folder(_)) => Err(AppError::invalid_operation(format!(
                "folder '{id}' is in the trash"
            ))),
            Some(Entity::File(_)) => Err(AppError::invalid_operation(format!(
                "'{id}' is a file, not a folder"
            ))),
            None => Err(AppError::not_found(format!("folder '{id}' not found"))),
        }
    }

    fn mint(&mut self, kind: EntityKind) -> EntityId {
        match kind {
            EntityKind::Folder => {
                let id = EntityId::new(format!("f-{}", self.next_folder));
                self.next_folder += 1;
                id
            }
            EntityKind::File => {
                let id = EntityId::new(format!("file-{}", self.next_file));
                self.next_file += 1;
                id
            }
        }
    }

    /// Stores a fresh copy of `source` and returns its new id.
    fn duplicate(&mut self, source: &Entity, parent_id: Option<EntityId>, name: String) -> EntityId {
        let id = self.mint(source.kind());
        let now = Utc::now();
        let copy = match source.clone() {
            Entity::Folder(mut folder) => {
                folder.id = id.clone();
                folder.name = name;
                folder.parent_id = parent_id;
                folder.created_at = now;
                folder.updated_at = now;
                folder.deleted_at = None;
                Entity::Folder(folder)
            }
            Entity::File(mut file) => {
                file.source_url = format!("/files/{id}/content");
                file.id = id.clone();
                file.name = name;
                file.parent_id = parent_id;
                file.created_at = now;
                file.updated_at = now;
                file.deleted_at = None;
                Entity::File(file)
            }
        };
        self.entities.insert(id.clone(), copy);
        id
    }

    /// Whether `candidate` is `ancestor` or lies beneath it.
    fn is_within(&self, candidate: &EntityId, ancestor: &EntityId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(candidate.clone());
        while let Some(id) = current {
            if &id == ancestor {
                return true;
            }
            if !seen.insert(id.clone()) {
                return false;
            }
            current = self.entities.get(&id).and_then(|e| e.parent_id().cloned());
        }
        false
    }

    /// Live, with every ancestor live too.
    fn is_reachable(&self, id: &EntityId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(id.clone());
        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                return false;
            }
            match self.entities.get(&id) {
                Some(e) if e.is_live() => current = e.parent_id().cloned(),
                _ => return false,
            }
        }
        true
    }

    fn reachable<F>(&self, filter: F) -> Vec<Entity>
    where
        F: Fn(&Entity) -> bool,
    {
        self.entities
            .values()
            .filter(|e| filter(e) && self.is_reachable(e.id()))
            .map(|e| self.decorate(e))
            .collect()
    }

    /// Fills in folder counts and cumulative size.
    fn decorate(&self, entity: &Entity) -> Entity {
        let Entity::Folder(folder) = entity else {
            return entity.clone();
        };
        let mut folder = folder.clone();
        let children = self
            .entities
            .values()
            .filter(|e| e.is_live() && e.parent_id() == Some(&folder.id));
        let (mut folders, mut files) = (0, 0);
        for child in children {
            match child.kind() {
                EntityKind::Folder => folders += 1,
                EntityKind::File => files += 1,
            }
        }
        folder.child_folder_count = folders;
        folder.child_file_count = files;
        folder.size = self
            .entities
            .values()
            .filter(|e| {
                e.kind() == EntityKind::File
                    && e.is_live()
                    && e.id() != &folder.id
                    && self.is_within(e.id(), &folder.id)
            })
            .map(Entity::size)
            .sum();
        Entity::Folder(folder)
    }

    fn stats(&self) -> StorageStats {
        let mut stats = StorageStats::default();
        for entity in self.entities.values() {
            if !entity.is_live() {
                stats.trashed_count += 1;
                continue;
            }
            if !self.is_reachable(entity.id()) {
                continue;
            }
            match entity.kind() {
                EntityKind::Folder => stats.folder_count += 1,
                EntityKind::File => {
                    stats.file_count += 1;
                    stats.total_bytes += entity.size();
                }
            }
        }
        stats
    }
}

fn valid_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    Ok(name)
}
