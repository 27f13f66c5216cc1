use std::sync::Arc;

use anyhow::{Error, Result};
use tracing::{debug, info};

use crate::{
    activities::{ContentRenderer, SnapshotStore},
    models::notification::{NotificationDefinition, SendingSnapshot},
};

/// Renders a notification into its sending card and persists the immutable
/// snapshot record. Errors propagate to the coordinator's retry policy: a
/// missing snapshot blocks all downstream sends, so there is no local
/// failure-swallowing here.
pub struct SnapshotWriter {
    renderer: Arc<dyn ContentRenderer>,
    snapshot_store: Arc<dyn SnapshotStore>,
}

impl SnapshotWriter {
    pub fn new(renderer: Arc<dyn ContentRenderer>, snapshot_store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            renderer,
            snapshot_store,
        }
    }

    pub async fn prepare_snapshot(
        &self,
        notification: &NotificationDefinition,
    ) -> Result<(), Error> {
        debug!(notification_id = %notification.id, "Rendering notification card");

        let card = self.renderer.render(notification).await?;

        let snapshot = SendingSnapshot::new(&notification.id, card);

        // No read-before-write: the coordinator may re-invoke this step after
        // a crash between the write and the step acknowledgement.
        self.snapshot_store.upsert(&snapshot).await?;

        info!(
            notification_id = %notification.id,
            "Sending snapshot persisted"
        );

        Ok(())
    }
}
