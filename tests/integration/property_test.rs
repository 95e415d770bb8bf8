//! Integration tests for the cache guarantees that hold across every
//! mutation kind.

mod helpers;

use std::time::Duration;

use drivesync_core::error::ErrorKind;
use drivesync_entity::{ColorTag, ViewKey, ViewStatus};
use drivesync_service::{BulkError, MutationDescriptor, RemoteOp};

fn failing_descriptors() -> Vec<MutationDescriptor> {
    vec![
        MutationDescriptor::create_folder(None, "Q4"),
        MutationDescriptor::create_folder(Some("f-3".into()), "Q3"),
        MutationDescriptor::rename("file-7", "counter-offer.pdf"),
        MutationDescriptor::move_to("file-7", Some("f-1".into())),
        MutationDescriptor::copy_to("f-3", Some("f-1".into())),
        MutationDescriptor::delete("f-3"),
        MutationDescriptor::colorize("f-1", Some(ColorTag::Red)),
    ]
}

#[tokio::test]
async fn test_rejected_remote_restores_every_affected_view() {
    for descriptor in failing_descriptors() {
        let app = helpers::TestApp::new();
        let keys = app.open_all().await;
        let before = app.payloads(&keys);
        app.remote.set_offline(true);

        let label = descriptor.label();
        let err = app
            .client
            .submit_mutation(descriptor)
            .await
            .expect_err("remote is offline");

        assert_eq!(err.kind(), ErrorKind::MutationFailed, "{label}");
        assert_eq!(app.payloads(&keys), before, "{label}");
    }
}

#[tokio::test]
async fn test_rejected_trash_operations_restore_views() {
    let app = helpers::TestApp::new();
    let keys = app.open_all().await;
    app.client
        .submit_mutation(MutationDescriptor::delete("file-5"))
        .await
        .expect("delete");
    app.client.flush().await;

    let before = app.payloads(&keys);
    app.remote.set_offline(true);
    for descriptor in [
        MutationDescriptor::restore("file-5"),
        MutationDescriptor::permanent_delete("file-5"),
    ] {
        app.client
            .submit_mutation(descriptor)
            .await
            .expect_err("remote is offline");
        assert_eq!(app.payloads(&keys), before);
    }
    assert!(app.client.store().contains(&"file-5".into()));
}

#[tokio::test]
async fn test_rolled_back_creates_and_copies_leave_no_placeholder() {
    let app = helpers::TestApp::new();
    let keys = app.open_all().await;
    app.remote.set_offline(true);

    let outcome = app
        .client
        .submit_bulk([
            MutationDescriptor::create_folder(None, "Q4"),
            MutationDescriptor::create_folder(Some("f-1".into()), "Q1"),
            MutationDescriptor::copy_to("file-5", None),
            MutationDescriptor::copy_to("f-3", Some("f-1".into())),
        ])
        .await;
    assert_eq!(outcome.failed.len(), 4);

    for key in &keys {
        let view = app.view(key);
        assert!(view.rows.iter().all(|row| !row.is_optimistic()), "{key}");
        assert!(view.rows.iter().all(|row| !row.id().as_str().starts_with("temp-")), "{key}");
    }
}

#[tokio::test]
async fn test_moves_into_own_subtree_change_nothing() {
    let app = helpers::TestApp::new();
    let keys = app.open_all().await;
    app.open(ViewKey::contents(Some(&"f-9".into()))).await;
    let before = app.payloads(&keys);
    let folder = app.client.store().get(&"f-3".into());

    for parent in ["f-3", "f-9"] {
        let err = app
            .client
            .submit_mutation(MutationDescriptor::move_to("f-3", Some(parent.into())))
            .await
            .expect_err("cycle");
        assert_eq!(err.kind(), ErrorKind::InvalidOperation, "{parent}");
    }

    assert_eq!(app.payloads(&keys), before);
    assert_eq!(app.client.store().get(&"f-3".into()), folder);
    assert_eq!(app.remote.call_count(RemoteOp::Move), 0);
}

#[tokio::test]
async fn test_rename_to_current_name_commits_without_visible_change() {
    let app = helpers::TestApp::new();
    let keys = app.open_all().await;
    let before = app.payloads(&keys);
    let names: Vec<_> = keys.iter().map(|key| app.view(key).names().join("|")).collect();

    let outcome = app
        .client
        .submit_mutation(MutationDescriptor::rename("file-7", "offer.pdf"))
        .await
        .expect("committed");

    assert_eq!(outcome.label, "rename");
    assert_eq!(app.payloads(&keys), before);
    let after: Vec<_> = keys.iter().map(|key| app.view(key).names().join("|")).collect();
    assert_eq!(after, names);
    assert_eq!(app.remote.call_count(RemoteOp::Rename), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalidations_within_one_window_share_a_refetch() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::Recent).await;
    assert_eq!(app.remote.fetch_count(&ViewKey::Recent), 1);

    for _ in 0..5 {
        app.client.scheduler().invalidate(ViewKey::Recent);
    }
    assert_eq!(app.client.scheduler().pending(), vec![ViewKey::Recent]);

    tokio::time::sleep(app.client.scheduler().window() + Duration::from_millis(10)).await;
    assert_eq!(app.remote.fetch_count(&ViewKey::Recent), 2);
    assert_eq!(app.view(&ViewKey::Recent).status, ViewStatus::Idle);
}

#[tokio::test]
async fn test_failed_bulk_item_does_not_undo_its_siblings() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    app.remote.poison("file-7");

    let outcome = app
        .client
        .submit_bulk([
            MutationDescriptor::delete("file-5"),
            MutationDescriptor::delete("file-7"),
        ])
        .await;

    assert_eq!(outcome.committed.len(), 1);
    assert_eq!(outcome.failed.len(), 1);
    let ids = app.ids(&ViewKey::root());
    assert!(!ids.contains(&"file-5".to_string()));
    assert!(ids.contains(&"file-7".to_string()));

    match outcome.into_result() {
        Err(BulkError::Partial { committed, failed }) => {
            assert_eq!(committed.len(), 1);
            assert_eq!(failed.len(), 1);
        }
        other => panic!("expected a partial failure, got {other:?}"),
    }
}
