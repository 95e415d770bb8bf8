//! Integration tests for single mutations end to end.

mod helpers;

use drivesync_core::error::ErrorKind;
use drivesync_core::events::{EventPayload, MutationEvent};
use drivesync_entity::{ColorTag, EntityId, ViewKey, ViewStatus};
use drivesync_service::{MutationDescriptor, MutationError, RemoteOp};

#[tokio::test]
async fn test_create_replaces_placeholder_with_server_folder() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;

    let pending = app
        .client
        .coordinator()
        .submit(MutationDescriptor::create_folder(None, "Reports"))
        .expect("valid create");

    let view = app.view(&ViewKey::root());
    assert_eq!(view.rows[0].id(), &EntityId::from("temp-1"));
    assert_eq!(view.rows[0].name(), "Reports");
    assert!(view.rows[0].is_optimistic());

    let outcome = pending.resolve().await.expect("commit");
    assert_eq!(outcome.label, "create_folder");

    let view = app.view(&ViewKey::root());
    assert_eq!(view.rows[0].id(), &EntityId::from("f-42"));
    assert!(!view.rows[0].is_optimistic());
    assert_eq!(view.status, ViewStatus::Stale);

    app.client.flush().await;
    assert_eq!(
        app.view(&ViewKey::root()).names(),
        vec!["Drafts", "Listings", "Reports", "contract.pdf", "offer.pdf"]
    );
}

#[tokio::test]
async fn test_delete_drops_rows_then_lands_in_trash() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    app.open(ViewKey::Recent).await;
    app.open(ViewKey::Trash).await;
    assert!(app.ids(&ViewKey::Recent).contains(&"file-7".to_string()));

    let pending = app
        .client
        .coordinator()
        .submit(MutationDescriptor::delete("file-7"))
        .expect("valid delete");
    assert!(!app.ids(&ViewKey::root()).contains(&"file-7".to_string()));
    assert!(!app.ids(&ViewKey::Recent).contains(&"file-7".to_string()));

    pending.resolve().await.expect("commit");
    let stored = app.client.store().get(&"file-7".into()).expect("still cached");
    assert!(stored.deleted_at().is_some());
    assert_eq!(app.view(&ViewKey::Trash).status, ViewStatus::Stale);

    app.client.flush().await;
    assert_eq!(app.ids(&ViewKey::Trash), vec!["file-7"]);
    assert_eq!(app.remote.fetch_count(&ViewKey::Trash), 2);
}

#[tokio::test]
async fn test_move_into_descendant_is_rejected_before_any_change() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    app.open(ViewKey::contents(Some(&"f-3".into()))).await;
    let before = app.view(&ViewKey::root());

    let err = app
        .client
        .submit_mutation(MutationDescriptor::move_to("f-3", Some("f-9".into())))
        .await
        .expect_err("cycle");

    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert_eq!(app.view(&ViewKey::root()), before);
    assert_eq!(app.remote.call_count(RemoteOp::Move), 0);
}

#[tokio::test]
async fn test_failed_copy_removes_placeholder() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    let before = app.client.views().payload(&ViewKey::root());
    app.remote.fail_next(RemoteOp::Copy);

    let pending = app
        .client
        .coordinator()
        .submit(MutationDescriptor::copy_to("file-5", None))
        .expect("valid copy");
    let view = app.view(&ViewKey::root());
    assert_eq!(view.rows[0].name(), "contract.pdf (Copy)");
    assert!(view.rows[0].is_optimistic());

    let err = pending.resolve().await.expect_err("injected failure");
    assert!(err.is_rolled_back());
    assert_eq!(app.client.views().payload(&ViewKey::root()), before);
    assert_eq!(app.remote.call_count(RemoteOp::Copy), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_remote_times_out_and_rolls_back() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    let before_view = app.view(&ViewKey::root());
    let before = before_view.names();
    app.script.stall_mutations(true);

    let err = app
        .client
        .submit_mutation(MutationDescriptor::rename("file-7", "counter-offer.pdf"))
        .await
        .expect_err("timeout");

    match err {
        MutationError::Failed { cause, .. } => assert_eq!(cause.kind, ErrorKind::Timeout),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(app.view(&ViewKey::root()).names(), before);
    assert_eq!(app.client.coordinator().in_flight(), 0);
}

#[tokio::test]
async fn test_unusable_server_answer_is_healed_by_refetch() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    app.script.blank_ids(true);

    let err = app
        .client
        .submit_mutation(MutationDescriptor::create_folder(None, "Ghost"))
        .await
        .expect_err("blank id");
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    assert_eq!(app.view(&ViewKey::root()).status, ViewStatus::Stale);

    app.client.flush().await;
    let view = app.view(&ViewKey::root());
    assert!(view.rows.iter().all(|row| !row.is_optimistic()));
    assert!(view.names().contains(&"Ghost"));
}

#[tokio::test]
async fn test_colorize_updates_every_view_holding_the_folder() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;

    app.client
        .submit_mutation(MutationDescriptor::colorize("f-3", Some(ColorTag::Green)))
        .await
        .expect("commit");

    let listing = app.view(&ViewKey::root());
    let folder = listing
        .rows
        .iter()
        .find_map(|row| row.as_folder().filter(|f| f.id == EntityId::from("f-3")))
        .expect("listed");
    assert_eq!(folder.color_tag, Some(ColorTag::Green));
}

#[tokio::test]
async fn test_trash_restore_and_purge() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    app.open(ViewKey::Trash).await;

    app.client
        .submit_mutation(MutationDescriptor::delete("file-5"))
        .await
        .expect("delete");
    app.client.flush().await;
    assert_eq!(app.ids(&ViewKey::Trash), vec!["file-5"]);

    app.client
        .submit_mutation(MutationDescriptor::restore("file-5"))
        .await
        .expect("restore");
    app.client.flush().await;
    assert!(app.ids(&ViewKey::Trash).is_empty());
    assert!(app.ids(&ViewKey::root()).contains(&"file-5".to_string()));

    app.client
        .submit_mutation(MutationDescriptor::delete("file-5"))
        .await
        .expect("delete again");
    app.client.flush().await;
    let pending = app
        .client
        .coordinator()
        .submit(MutationDescriptor::permanent_delete("file-5"))
        .expect("trashed target");
    assert!(app.ids(&ViewKey::Trash).is_empty());
    pending.resolve().await.expect("purge");

    assert!(app.client.store().get(&"file-5".into()).is_none());
    assert!(app.remote.entity(&"file-5".into()).is_none());
}

#[tokio::test]
async fn test_lifecycle_events_are_published_in_order() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    let mut events = app.client.events();

    app.client
        .submit_mutation(MutationDescriptor::rename("f-1", "Drafts (old)"))
        .await
        .expect("commit");
    let _ = app
        .client
        .submit_mutation(MutationDescriptor::rename("f-1", "   "))
        .await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let EventPayload::Mutation(event) = event.payload {
            seen.push(match event {
                MutationEvent::Submitted { .. } => "submitted",
                MutationEvent::Committed { .. } => "committed",
                MutationEvent::RolledBack { .. } => "rolled_back",
                MutationEvent::Rejected { .. } => "rejected",
            });
        }
    }
    assert_eq!(seen, vec!["submitted", "committed", "rejected"]);
}
