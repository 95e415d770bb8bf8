//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use drivesync_core::config::AppConfig;
use drivesync_core::result::AppResult;
use drivesync_entity::{
    ColorTag, Entity, EntityId, EntityKind, FetchedView, File, Folder, ViewKey, ViewPayload,
    ViewSnapshot,
};
use drivesync_service::{DriveClient, MemoryRemote, RemoteResourceApi};

/// Test application context
pub struct TestApp {
    /// The client under test
    pub client: DriveClient,
    /// Authoritative state behind it
    pub remote: Arc<MemoryRemote>,
    /// Switches on the wrapper between the two
    pub script: Arc<ScriptedRemote>,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a test application over the standard tree:
    ///
    /// ```text
    /// root
    /// ├── f-1  Drafts
    /// ├── f-3  Listings
    /// │   └── f-9  Closings
    /// │       └── file-9  deed.pdf
    /// ├── file-5  contract.pdf
    /// └── file-7  offer.pdf
    /// ```
    ///
    /// The coalescing window is wide, so views only refetch on an explicit
    /// flush unless a test waits the window out.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.scheduler.coalesce_window_ms = 5_000;
        config.remote.timeout_ms = 1_000;
        Self::with_config(config)
    }

    /// Create a test application with custom configuration
    pub fn with_config(config: AppConfig) -> Self {
        let remote = Arc::new(MemoryRemote::new());
        remote.seed(Folder::new("f-1", "Drafts", None));
        remote.seed(Folder::new("f-3", "Listings", None));
        remote.seed(Folder::new("f-9", "Closings", Some("f-3".into())));
        remote.seed(File::new("file-9", "deed.pdf", Some("f-9".into()), 300, "application/pdf"));
        remote.seed(File::new("file-5", "contract.pdf", None, 200, "application/pdf"));
        remote.seed(File::new("file-7", "offer.pdf", None, 120, "application/pdf"));
        remote.set_next_ids(42, 100);

        let script = Arc::new(ScriptedRemote::new(Arc::clone(&remote)));
        let client = DriveClient::new(&config, script.clone());
        Self {
            client,
            remote,
            script,
            config,
        }
    }

    /// Register and populate a view
    pub async fn open(&self, key: ViewKey) -> ViewSnapshot {
        self.client.refresh(key).await.expect("Failed to open view")
    }

    /// Open the root listing plus every other view a typical screen shows
    pub async fn open_all(&self) -> Vec<ViewKey> {
        let keys = vec![
            ViewKey::root(),
            ViewKey::contents(Some(&"f-1".into())),
            ViewKey::contents(Some(&"f-3".into())),
            ViewKey::Recent,
            ViewKey::Trash,
            ViewKey::Stats,
        ];
        for key in &keys {
            self.open(key.clone()).await;
        }
        keys
    }

    /// Current snapshot of a registered view
    pub fn view(&self, key: &ViewKey) -> ViewSnapshot {
        self.client.view(key).expect("View not registered")
    }

    /// Raw payloads of several views, for before/after comparisons
    pub fn payloads(&self, keys: &[ViewKey]) -> Vec<Option<ViewPayload>> {
        keys.iter().map(|key| self.client.views().payload(key)).collect()
    }

    /// Row ids of a view, in order
    pub fn ids(&self, key: &ViewKey) -> Vec<String> {
        self.view(key)
            .rows
            .iter()
            .map(|e| e.id().to_string())
            .collect()
    }
}

/// Delegates to a [`MemoryRemote`] but can stall mutations forever or
/// answer with entities that lost their id.
#[derive(Debug)]
pub struct ScriptedRemote {
    inner: Arc<MemoryRemote>,
    stall: AtomicBool,
    blank_ids: AtomicBool,
    fetch_delay_ms: AtomicU64,
}

impl ScriptedRemote {
    pub fn new(inner: Arc<MemoryRemote>) -> Self {
        Self {
            inner,
            stall: AtomicBool::new(false),
            blank_ids: AtomicBool::new(false),
            fetch_delay_ms: AtomicU64::new(0),
        }
    }

    /// Mutations hang until the client gives up on them.
    pub fn stall_mutations(&self, on: bool) {
        self.stall.store(on, Ordering::SeqCst);
    }

    /// Returned entities come back with an empty id.
    pub fn blank_ids(&self, on: bool) {
        self.blank_ids.store(on, Ordering::SeqCst);
    }

    /// View fetches answer only after `delay`.
    pub fn delay_fetches(&self, delay: Duration) {
        self.fetch_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn gate(&self) {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
        }
    }

    fn scrub(&self, mut entity: Entity) -> Entity {
        if self.blank_ids.load(Ordering::SeqCst) {
            match &mut entity {
                Entity::Folder(folder) => folder.id = EntityId::new(""),
                Entity::File(file) => file.id = EntityId::new(""),
            }
        }
        entity
    }
}

#[async_trait]
impl RemoteResourceApi for ScriptedRemote {
    async fn create_folder(&self, name: &str, parent_id: Option<&EntityId>) -> AppResult<Folder> {
        self.gate().await;
        let folder = self.inner.create_folder(name, parent_id).await?;
        match self.scrub(folder.into()) {
            Entity::Folder(folder) => Ok(folder),
            Entity::File(_) => unreachable!("scrub keeps the variant"),
        }
    }

    async fn rename_entity(&self, kind: EntityKind, id: &EntityId, name: &str) -> AppResult<Entity> {
        self.gate().await;
        Ok(self.scrub(self.inner.rename_entity(kind, id, name).await?))
    }

    async fn move_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
        new_parent_id: Option<&EntityId>,
    ) -> AppResult<Entity> {
        self.gate().await;
        Ok(self.scrub(self.inner.move_entity(kind, id, new_parent_id).await?))
    }

    async fn copy_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
        new_parent_id: Option<&EntityId>,
    ) -> AppResult<Entity> {
        self.gate().await;
        Ok(self.scrub(self.inner.copy_entity(kind, id, new_parent_id).await?))
    }

    async fn soft_delete(&self, kind: EntityKind, id: &EntityId) -> AppResult<()> {
        self.gate().await;
        self.inner.soft_delete(kind, id).await
    }

    async fn restore(&self, kind: EntityKind, id: &EntityId) -> AppResult<()> {
        self.gate().await;
        self.inner.restore(kind, id).await
    }

    async fn permanent_delete(&self, kind: EntityKind, id: &EntityId) -> AppResult<()> {
        self.gate().await;
        self.inner.permanent_delete(kind, id).await
    }

    async fn set_color(&self, id: &EntityId, color: Option<ColorTag>) -> AppResult<Folder> {
        self.gate().await;
        self.inner.set_color(id, color).await
    }

    async fn fetch_view(&self, key: &ViewKey) -> AppResult<FetchedView> {
        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.fetch_view(key).await
    }
}
