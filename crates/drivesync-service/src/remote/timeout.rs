//! Deadline enforcement around any remote.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use drivesync_core::config::remote::RemoteConfig;
use drivesync_core::error::AppError;
use drivesync_core::result::AppResult;
use drivesync_entity::{ColorTag, Entity, EntityId, EntityKind, FetchedView, Folder, ViewKey};

use super::RemoteResourceApi;

/// Fails any call that outlives the configured deadline with
/// [`ErrorKind::Timeout`](drivesync_core::error::ErrorKind::Timeout).
#[derive(Debug, Clone)]
pub struct TimeoutRemote {
    inner: Arc<dyn RemoteResourceApi>,
    limit: Duration,
}

impl TimeoutRemote {
    /// Wrap `inner` with a fixed deadline.
    pub fn new(inner: Arc<dyn RemoteResourceApi>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    /// Wrap `inner` using the configured deadline.
    pub fn from_config(inner: Arc<dyn RemoteResourceApi>, config: &RemoteConfig) -> Self {
        Self::new(inner, Duration::from_millis(config.timeout_ms))
    }

    async fn guard<T, F>(&self, op: &str, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>> + Send,
    {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, limit_ms = self.limit.as_millis() as u64, "Remote call timed out");
                Err(AppError::timeout(format!(
                    "{op} did not answer within {} ms",
                    self.limit.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl RemoteResourceApi for TimeoutRemote {
    async fn create_folder(&self, name: &str, parent_id: Option<&EntityId>) -> AppResult<Folder> {
        self.guard("create_folder", self.inner.create_folder(name, parent_id))
            .await
    }

    async fn rename_entity(&self, kind: EntityKind, id: &EntityId, name: &str) -> AppResult<Entity> {
        self.guard("rename_entity", self.inner.rename_entity(kind, id, name))
            .await
    }

    async fn move_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
        new_parent_id: Option<&EntityId>,
    ) -> AppResult<Entity> {
        self.guard("move_entity", self.inner.move_entity(kind, id, new_parent_id))
            .await
    }

    async fn copy_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
        new_parent_id: Option<&EntityId>,
    ) -> AppResult<Entity> {
        self.guard("copy_entity", self.inner.copy_entity(kind, id, new_parent_id))
            .await
    }

    async fn soft_delete(&self, kind: EntityKind, id: &EntityId) -> AppResult<()> {
        self.guard("soft_delete", self.inner.soft_delete(kind, id)).await
    }

    async fn restore(&self, kind: EntityKind, id: &EntityId) -> AppResult<()> {
        self.guard("restore", self.inner.restore(kind, id)).await
    }

    async fn permanent_delete(&self, kind: EntityKind, id: &EntityId) -> AppResult<()> {
        self.guard("permanent_delete", self.inner.permanent_delete(kind, id))
            .await
    }

    async fn set_color(&self, id: &EntityId, color: Option<ColorTag>) -> AppResult<Folder> {
        self.guard("set_color", self.inner.set_color(id, color)).await
    }

    async fn fetch_view(&self, key: &ViewKey) -> AppResult<FetchedView> {
        self.guard("fetch_view", self.inner.fetch_view(key)).await
    }
}
