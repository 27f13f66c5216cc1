mod common;

use std::sync::{Arc, atomic::Ordering};

use anyhow::Result;
use common::{InMemorySnapshotStore, StubRenderer, notification_with_batches};
use prepare_service::{
    activities::snapshot::SnapshotWriter,
    models::notification::SENDING_NOTIFICATIONS_PARTITION,
};

/// Test: Snapshot is persisted under the sending partition with the
/// notification id as row key and the rendered content
#[tokio::test]
async fn test_snapshot_persisted_with_rendered_content() -> Result<()> {
    let renderer = Arc::new(StubRenderer::returning(r#"{"type":"AdaptiveCard"}"#));
    let store = Arc::new(InMemorySnapshotStore::new());

    let writer = SnapshotWriter::new(renderer, store.clone());
    let notification = notification_with_batches("n-100", &[2]);

    writer.prepare_snapshot(&notification).await?;

    let snapshot = store
        .get(SENDING_NOTIFICATIONS_PARTITION, "n-100")
        .expect("snapshot should exist");

    assert_eq!(snapshot.notification_id, "n-100");
    assert_eq!(snapshot.row_key, "n-100");
    assert_eq!(snapshot.content, r#"{"type":"AdaptiveCard"}"#);
    assert_eq!(store.len(), 1, "Exactly one record per notification");

    Ok(())
}

/// Test: Re-running the snapshot step is an idempotent last-write-wins upsert
#[tokio::test]
async fn test_rerun_overwrites_with_current_content() -> Result<()> {
    let renderer = Arc::new(StubRenderer::returning(r#"{"version":"1.0"}"#));
    let store = Arc::new(InMemorySnapshotStore::new());

    let writer = SnapshotWriter::new(renderer.clone(), store.clone());
    let notification = notification_with_batches("n-101", &[]);

    writer.prepare_snapshot(&notification).await?;
    writer.prepare_snapshot(&notification).await?;

    assert_eq!(store.len(), 1, "Re-execution must not create a second record");

    // Notification content changed between retries: the latest render wins.
    renderer.set_output(r#"{"version":"1.1"}"#);
    writer.prepare_snapshot(&notification).await?;

    let snapshot = store
        .get(SENDING_NOTIFICATIONS_PARTITION, "n-101")
        .expect("snapshot should exist");

    assert_eq!(snapshot.content, r#"{"version":"1.1"}"#);
    assert_eq!(store.len(), 1);

    Ok(())
}

/// Test: Rendering errors propagate and nothing is written
#[tokio::test]
async fn test_render_error_propagates_without_write() -> Result<()> {
    let renderer = Arc::new(StubRenderer::failing_times("unused", u32::MAX));
    let store = Arc::new(InMemorySnapshotStore::new());

    let writer = SnapshotWriter::new(renderer, store.clone());
    let notification = notification_with_batches("n-102", &[1]);

    let result = writer.prepare_snapshot(&notification).await;

    assert!(result.is_err(), "Render failure must abort the step");
    assert_eq!(store.len(), 0, "No snapshot without a valid rendered card");
    assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

/// Test: Persistence errors propagate to the caller
#[tokio::test]
async fn test_store_error_propagates() -> Result<()> {
    let renderer = Arc::new(StubRenderer::returning("{}"));
    let store = Arc::new(InMemorySnapshotStore::failing_times(u32::MAX));

    let writer = SnapshotWriter::new(renderer, store.clone());
    let notification = notification_with_batches("n-103", &[1]);

    let result = writer.prepare_snapshot(&notification).await;

    assert!(result.is_err(), "Store failure must surface to the coordinator");
    assert_eq!(store.len(), 0);

    Ok(())
}
