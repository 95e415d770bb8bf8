//! DriveSync demo: drives the client cache against an in-memory remote.
//!
//! Loads configuration, initialises logging, seeds a small folder tree and
//! runs a scripted session of optimistic mutations.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use drivesync_core::config::AppConfig;
use drivesync_core::error::AppError;
use drivesync_core::events::EventPayload;
use drivesync_entity::{ColorTag, File, Folder, ViewKey, ViewSnapshot};
use drivesync_service::{DriveClient, MemoryRemote, MutationDescriptor, RemoteOp};

#[tokio::main]
async fn main() {
    let env = std::env::var("DRIVESYNC_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

fn seed_remote(config: &AppConfig) -> Arc<MemoryRemote> {
    let remote = MemoryRemote::new()
        .with_latency(Duration::from_millis(40))
        .with_recent_limit(config.cache.recent_limit)
        .with_copy_suffix(config.cache.copy_suffix.clone());

    remote.seed(Folder::new("f-1", "Projects", None));
    remote.seed(Folder::new("f-2", "Photos", None));
    remote.seed(Folder::new("f-3", "Archive", Some("f-1".into())));
    remote.seed(File::new("file-1", "plan.md", Some("f-1".into()), 2_048, "text/markdown"));
    remote.seed(File::new("file-2", "beach.jpg", Some("f-2".into()), 512_000, "image/jpeg"));
    remote.seed(File::new("file-3", "notes.txt", None, 128, "text/plain"));
    remote.set_next_ids(100, 100);
    Arc::new(remote)
}

fn show(label: &str, snapshot: &ViewSnapshot) {
    tracing::info!(
        view = %snapshot.key,
        status = ?snapshot.status,
        pending = snapshot.pending_overlays,
        rows = ?snapshot.names(),
        stats = ?snapshot.stats,
        "{label}"
    );
}

/// Scripted session
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DriveSync demo v{}", env!("CARGO_PKG_VERSION"));

    let remote = seed_remote(&config);
    let client = DriveClient::new(&config, remote.clone());

    let mut events = client.events();
    let event_log = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.payload {
                EventPayload::Mutation(m) => tracing::debug!(event = ?m, "Mutation event"),
                EventPayload::View(v) => tracing::debug!(event = ?v, "View event"),
            }
        }
    });

    let root = client.observe_view(ViewKey::root());
    let _stats = client.observe_view(ViewKey::Stats);
    client.flush().await;
    show("Initial root", &root.borrow());

    // Optimistic create: the placeholder shows before the remote answers.
    let pending = client
        .coordinator()
        .submit(MutationDescriptor::create_folder(None, "Invoices"))?;
    show("Create submitted", &root.borrow());
    let created = pending.resolve().await?;
    tracing::info!(id = ?created.entity.as_ref().map(|e| e.id().to_string()), "Folder created");

    client
        .submit_mutation(MutationDescriptor::rename("file-3", "todo.txt"))
        .await?;
    client
        .submit_mutation(MutationDescriptor::colorize("f-2", Some(ColorTag::Blue)))
        .await?;

    // A failing move rolls back.
    remote.fail_next(RemoteOp::Move);
    if let Err(e) = client
        .submit_mutation(MutationDescriptor::move_to("file-3", Some("f-2".into())))
        .await
    {
        tracing::warn!(error = %e, "Move rolled back as expected");
    }

    // Cut two entries and paste them into Projects.
    client.ui().toggle_select("f-2");
    client.ui().toggle_select("file-3");
    client.cut_selection();
    let pasted = client.paste(Some("f-1".into())).await?;
    tracing::info!(
        committed = pasted.committed.len(),
        failed = pasted.failed.len(),
        "Paste settled"
    );

    client.flush().await;
    show("Root after session", &root.borrow());
    if let Some(stats) = client.view(&ViewKey::Stats) {
        show("Stats", &stats);
    }
    let projects = client.refresh(ViewKey::contents(Some(&"f-1".into()))).await?;
    show("Projects", &projects);

    drop(client);
    event_log.abort();
    tracing::info!("Demo finished");
    Ok(())
}
