//! Integration tests for view observation, refetch and staleness.

mod helpers;

use std::time::Duration;

use drivesync_core::events::{EventPayload, ViewEvent};
use drivesync_entity::{StorageStats, ViewKey, ViewStatus};
use drivesync_service::{MutationDescriptor, RemoteOp};

#[tokio::test(start_paused = true)]
async fn test_observed_view_is_populated_after_the_window() {
    let app = helpers::TestApp::new();
    let listings = ViewKey::contents(Some(&"f-3".into()));

    let rx = app.client.observe_view(listings.clone());
    assert_eq!(rx.borrow().status, ViewStatus::Stale);
    assert!(rx.borrow().rows.is_empty());

    let _again = app.client.observe_view(listings.clone());
    assert_eq!(app.client.scheduler().pending(), vec![listings.clone()]);

    tokio::time::sleep(app.client.scheduler().window() + Duration::from_millis(1)).await;
    assert_eq!(rx.borrow().status, ViewStatus::Idle);
    assert_eq!(rx.borrow().names(), vec!["Closings"]);
    assert_eq!(app.remote.fetch_count(&listings), 1);
}

#[tokio::test]
async fn test_failed_refetch_keeps_rows_and_flags_error() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    let mut events = app.client.events();
    app.remote.set_offline(true);

    app.client.scheduler().invalidate(ViewKey::root());
    let summary = app.client.flush().await;
    assert_eq!(summary.failed, 1);

    let view = app.view(&ViewKey::root());
    assert_eq!(view.status, ViewStatus::Error);
    assert_eq!(view.names(), vec!["Drafts", "Listings", "contract.pdf", "offer.pdf"]);

    let mut failures = 0;
    while let Ok(event) = events.try_recv() {
        if let EventPayload::View(ViewEvent::RefetchFailed { view, .. }) = event.payload {
            assert_eq!(view, "contents:root");
            failures += 1;
        }
    }
    assert_eq!(failures, 1);

    app.remote.set_offline(false);
    app.client.scheduler().invalidate(ViewKey::root());
    let summary = app.client.flush().await;
    assert_eq!(summary.refetched, 1);
    assert_eq!(app.view(&ViewKey::root()).status, ViewStatus::Idle);
}

#[tokio::test]
async fn test_refetch_during_pending_mutation_keeps_optimistic_effect() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;

    let pending = app
        .client
        .coordinator()
        .submit(MutationDescriptor::delete("file-7"))
        .expect("valid delete");

    // The remote still lists file-7 because the delete was never sent.
    let view = app.client.refresh(ViewKey::root()).await.expect("refresh");
    assert!(!view.rows.iter().any(|row| row.id().as_str() == "file-7"));
    assert_eq!(view.pending_overlays, 1);

    pending.resolve().await.expect("commit");
    app.client.flush().await;
    assert!(!app.ids(&ViewKey::root()).contains(&"file-7".to_string()));
    assert_eq!(app.view(&ViewKey::root()).pending_overlays, 0);
}

#[tokio::test]
async fn test_stats_follow_committed_deletes() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    let stats = app.open(ViewKey::Stats).await;
    assert_eq!(
        stats.stats,
        Some(StorageStats {
            folder_count: 3,
            file_count: 3,
            total_bytes: 620,
            trashed_count: 0,
        })
    );

    app.client
        .submit_mutation(MutationDescriptor::delete("file-5"))
        .await
        .expect("delete");
    assert_eq!(app.view(&ViewKey::Stats).status, ViewStatus::Stale);

    app.client.flush().await;
    let stats = app.view(&ViewKey::Stats).stats.expect("stats payload");
    assert_eq!(stats.file_count, 2);
    assert_eq!(stats.total_bytes, 420);
    assert_eq!(stats.trashed_count, 1);
}

#[tokio::test]
async fn test_closed_view_drops_its_observers() {
    let app = helpers::TestApp::new();
    let rx = app.client.observe_view(ViewKey::Trash);
    assert!(app.client.close_view(&ViewKey::Trash));
    assert!(rx.has_changed().is_err());
    assert!(app.client.view(&ViewKey::Trash).is_none());

    // The queued refetch finds nothing to do.
    let summary = app.client.flush().await;
    assert_eq!(summary.refetched, 0);
    assert_eq!(app.remote.fetch_count(&ViewKey::Trash), 0);
}

#[tokio::test]
async fn test_failed_mutation_keeps_error_flag_of_untouched_data() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    app.remote.set_offline(true);
    app.client.scheduler().invalidate(ViewKey::root());
    app.client.flush().await;
    let before = app.view(&ViewKey::root());
    assert_eq!(before.status, ViewStatus::Error);

    app.client
        .submit_mutation(MutationDescriptor::rename("file-7", "counter-offer.pdf"))
        .await
        .expect_err("remote is offline");

    let after = app.view(&ViewKey::root());
    assert_eq!(after.status, ViewStatus::Error);
    assert_eq!(after.names(), before.names());
}

#[tokio::test(start_paused = true)]
async fn test_failed_mutation_keeps_loading_state_of_running_fetch() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    let before = app.view(&ViewKey::root()).names().join("|");
    app.script.delay_fetches(Duration::from_millis(200));

    let client = app.client.clone();
    let fetch = tokio::spawn(async move { client.refresh(ViewKey::root()).await });
    for _ in 0..10 {
        if app.view(&ViewKey::root()).status == ViewStatus::Fetching {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(app.view(&ViewKey::root()).status, ViewStatus::Fetching);

    app.remote.fail_next(RemoteOp::Rename);
    app.client
        .submit_mutation(MutationDescriptor::rename("file-7", "counter-offer.pdf"))
        .await
        .expect_err("injected failure");

    let view = app.view(&ViewKey::root());
    assert_eq!(view.status, ViewStatus::Fetching);
    assert_eq!(view.names().join("|"), before);

    let refreshed = fetch.await.expect("join").expect("refresh");
    assert_eq!(refreshed.status, ViewStatus::Idle);
}
