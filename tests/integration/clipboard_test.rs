//! Integration tests for clipboard, selection and paste.

mod helpers;

use drivesync_core::error::ErrorKind;
use drivesync_entity::{EntityId, ViewKey};
use drivesync_service::RemoteOp;

fn drafts() -> ViewKey {
    ViewKey::contents(Some(&"f-1".into()))
}

#[tokio::test]
async fn test_paste_after_cut_moves_items_and_clears_clipboard() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    app.open(drafts()).await;

    app.client.ui().toggle_select("file-7");
    app.client.ui().toggle_select("file-5");
    assert_eq!(app.client.cut_selection(), 2);

    let outcome = app.client.paste(Some("f-1".into())).await.expect("paste");
    assert_eq!(outcome.committed.len(), 2);
    assert!(outcome.is_complete());
    assert!(app.client.clipboard().is_none());

    let moved = app.client.store().get(&"file-7".into()).expect("cached");
    assert_eq!(moved.parent_id(), Some(&EntityId::from("f-1")));
    let root = app.ids(&ViewKey::root());
    assert!(!root.contains(&"file-7".to_string()));
    assert!(!root.contains(&"file-5".to_string()));

    app.client.flush().await;
    assert_eq!(app.view(&drafts()).names(), vec!["contract.pdf", "offer.pdf"]);
}

#[tokio::test]
async fn test_paste_after_copy_keeps_clipboard() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    app.open(drafts()).await;

    app.client.ui().toggle_select("f-3");
    assert_eq!(app.client.copy_selection(), 1);

    let outcome = app.client.paste(Some("f-1".into())).await.expect("paste");
    assert_eq!(outcome.committed.len(), 1);
    let copy = &app.view(&drafts()).rows[0];
    assert_eq!(copy.name(), "Listings (Copy)");
    assert!(!copy.is_optimistic());

    let clipboard = app.client.clipboard().expect("copy clipboard survives");
    assert!(clipboard.contains(&"f-3".into()));

    app.client.paste(Some("f-1".into())).await.expect("second paste");
    assert_eq!(app.remote.call_count(RemoteOp::Copy), 2);
    assert!(app.client.clipboard().is_some());
}

#[tokio::test]
async fn test_rejected_cut_keeps_clipboard() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    app.open(ViewKey::contents(Some(&"f-3".into()))).await;

    app.client.ui().toggle_select("f-3");
    app.client.cut_selection();

    let outcome = app.client.paste(Some("f-9".into())).await.expect("paste");
    assert!(outcome.committed.is_empty());
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].kind(), ErrorKind::InvalidOperation);

    let clipboard = app.client.clipboard().expect("kept");
    assert!(clipboard.is_cut());
}

#[tokio::test]
async fn test_paste_with_empty_clipboard_fails() {
    let app = helpers::TestApp::new();
    let err = app.client.paste(None).await.expect_err("nothing to paste");
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_range_selection_then_delete() {
    let app = helpers::TestApp::new();
    app.open(ViewKey::root()).await;
    let listing: Vec<EntityId> = app
        .view(&ViewKey::root())
        .rows
        .iter()
        .map(|row| row.id().clone())
        .collect();

    let selected = app
        .client
        .ui()
        .select_range(&"file-5".into(), &"f-3".into(), &listing);
    assert_eq!(selected, 2);

    let outcome = app.client.delete_selection().await.expect("delete");
    assert_eq!(outcome.committed.len(), 2);
    assert!(app.client.ui().selection().is_empty());
    assert_eq!(app.ids(&ViewKey::root()), vec!["f-1", "file-7"]);
}
