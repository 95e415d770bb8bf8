//! Remote resource API: the authoritative system every mutation and
//! refetch goes through.

pub mod memory;
pub mod timeout;

use async_trait::async_trait;

use drivesync_core::result::AppResult;
use drivesync_entity::{ColorTag, Entity, EntityId, EntityKind, FetchedView, Folder, ViewKey};

pub use memory::{MemoryRemote, RemoteOp};
pub use timeout::TimeoutRemote;

/// Operations the remote system exposes.
///
/// Every call is asynchronous and may fail with a transport or timeout
/// error. Returned entities are authoritative and replace any local copy.
#[async_trait]
pub trait RemoteResourceApi: Send + Sync + std::fmt::Debug + 'static {
    /// Create a folder under `parent_id` (root when `None`).
    async fn create_folder(&self, name: &str, parent_id: Option<&EntityId>) -> AppResult<Folder>;

    /// Rename a folder or file.
    async fn rename_entity(&self, kind: EntityKind, id: &EntityId, name: &str) -> AppResult<Entity>;

    /// Re-parent a folder or file.
    async fn move_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
        new_parent_id: Option<&EntityId>,
    ) -> AppResult<Entity>;

    /// Duplicate a folder (recursively) or file under `new_parent_id`.
    /// Returns the new top-level entity.
    async fn copy_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
        new_parent_id: Option<&EntityId>,
    ) -> AppResult<Entity>;

    /// Move an entity to the trash.
    async fn soft_delete(&self, kind: EntityKind, id: &EntityId) -> AppResult<()>;

    /// Bring a trashed entity back.
    async fn restore(&self, kind: EntityKind, id: &EntityId) -> AppResult<()>;

    /// Delete a trashed entity for good.
    async fn permanent_delete(&self, kind: EntityKind, id: &EntityId) -> AppResult<()>;

    /// Set or clear the color label of a folder.
    async fn set_color(&self, id: &EntityId, color: Option<ColorTag>) -> AppResult<Folder>;

    /// Recompute a view from authoritative state.
    async fn fetch_view(&self, key: &ViewKey) -> AppResult<FetchedView>;
}
