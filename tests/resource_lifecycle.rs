//! Integration tests for content lifecycles on the local backend:
//! create, list, edit, delete for every content type.
//!
//! Each test opens its own in-memory SQLite store, so the full path from
//! console to `kv_store` table is exercised.

use std::sync::Arc;
use std::time::Duration;

use sacco_admin::api::ApiClient;
use sacco_admin::config::Backend;
use sacco_admin::console::AdminConsole;
use sacco_admin::domain::{FormFields, ResourceKind};
use sacco_admin::notify::{NotificationKind, Notifier};
use sacco_admin::resource::ResourceError;
use sacco_admin::storage::{Database, KeyValueStore};
use url::Url;

async fn local_console() -> AdminConsole {
    let db = Database::open(":memory:").await.unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(db);
    let base = Url::parse("http://127.0.0.1:9/api/").unwrap();
    let api = ApiClient::new(
        base.clone(),
        base.join("public/").unwrap(),
        Duration::from_secs(1),
        store.clone(),
    );
    AdminConsole::new(
        Backend::Local,
        store,
        api,
        Notifier::new(Duration::from_secs(5)),
    )
}

fn sample_form(kind: ResourceKind) -> FormFields {
    match kind {
        ResourceKind::News => FormFields::new()
            .with("title", "Dividend payout announced")
            .with("category", "announcements")
            .with("content", "Members will receive 11% dividends.")
            .with("publish_date", "2026-03-01"),
        ResourceKind::Faq => FormFields::new()
            .with("question", "How do I become a member?")
            .with("category", "membership")
            .with("answer", "Fill in the membership form at any branch."),
        ResourceKind::Download => FormFields::new()
            .with("title", "Membership form")
            .with("file_type", "form")
            .with("upload", "/srv/uploads/membership.pdf"),
        ResourceKind::Gallery => FormFields::new()
            .with("title", "AGM 2025")
            .with("category", "events")
            .with("date", "2025-12-06")
            .with("upload", "/srv/uploads/agm.jpg"),
        ResourceKind::Team => FormFields::new()
            .with("name", "Grace Wanjiru")
            .with("role", "Loans Officer"),
        ResourceKind::Feedback => FormFields::new()
            .with("name", "Peter")
            .with("email", "peter@example.org")
            .with("message", "Great service at the Thika branch."),
    }
}

async fn listed_ids(console: &AdminConsole, kind: ResourceKind) -> Vec<i64> {
    console
        .list(kind)
        .await
        .unwrap()
        .unwrap()
        .rows
        .iter()
        .filter_map(|row| row.id)
        .collect()
}

// ============================================================================
// Create / Delete
// ============================================================================

#[tokio::test]
async fn test_created_item_is_listed_for_every_kind() {
    let console = local_console().await;

    for kind in ResourceKind::ALL {
        let id = console
            .create(kind, &sample_form(kind))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(id, 1, "{kind} ids start at 1");
        assert_eq!(listed_ids(&console, kind).await, vec![1], "{kind}");
    }
}

#[tokio::test]
async fn test_deleted_item_is_gone_for_every_kind() {
    let console = local_console().await;
    let yes = |_: &str| true;

    for kind in ResourceKind::ALL {
        console.create(kind, &sample_form(kind)).await.unwrap();
        console.create(kind, &sample_form(kind)).await.unwrap();

        console.delete(kind, 1, &yes).await.unwrap();
        assert_eq!(listed_ids(&console, kind).await, vec![2], "{kind}");
    }
}

#[tokio::test]
async fn test_declined_delete_keeps_item() {
    let console = local_console().await;
    let no = |_: &str| false;

    console
        .create(ResourceKind::News, &sample_form(ResourceKind::News))
        .await
        .unwrap();
    let err = console
        .delete(ResourceKind::News, 1, &no)
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::Cancelled));
    assert_eq!(listed_ids(&console, ResourceKind::News).await, vec![1]);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_missing_required_field_creates_nothing() {
    let console = local_console().await;
    let form = FormFields::new()
        .with("title", "Untitled")
        .with("category", "news");

    let err = console
        .create(ResourceKind::News, &form)
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::Validation(_)));
    assert!(listed_ids(&console, ResourceKind::News).await.is_empty());

    let banners = console.notifier().active();
    assert_eq!(banners[0].kind, NotificationKind::Error);
    assert_eq!(banners[0].message, "Content is required");
}

// ============================================================================
// Edit
// ============================================================================

#[tokio::test]
async fn test_edit_updates_in_place() {
    let console = local_console().await;
    console
        .create(ResourceKind::Team, &sample_form(ResourceKind::Team))
        .await
        .unwrap();

    let changes = FormFields::new().with("role", "Head of Credit");
    console.edit(ResourceKind::Team, 1, &changes).await.unwrap();

    let table = console.list(ResourceKind::Team).await.unwrap().unwrap();
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].cells[1], "Head of Credit");
}

#[tokio::test]
async fn test_edit_missing_record() {
    let console = local_console().await;
    let err = console
        .edit(ResourceKind::Faq, 5, &FormFields::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::NotFound { id: 5, .. }));
}

#[tokio::test]
async fn test_dashboard_counts_local_content() {
    let console = local_console().await;
    for _ in 0..3 {
        console
            .create(ResourceKind::Faq, &sample_form(ResourceKind::Faq))
            .await
            .unwrap();
    }
    console
        .create(ResourceKind::Feedback, &sample_form(ResourceKind::Feedback))
        .await
        .unwrap();

    let summary = console.dashboard().await;
    assert_eq!(summary.totals[&ResourceKind::Faq], Some(3));
    assert_eq!(summary.totals[&ResourceKind::News], Some(0));
    assert_eq!(summary.unread_feedback, Some(1));
}
