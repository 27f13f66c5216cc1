use anyhow::{Error, Result};
use tracing::{debug, info};

use crate::{
    activities::{dispatch::TriggerDispatcher, snapshot::SnapshotWriter},
    models::{
        notification::NotificationDefinition,
        retry::RetryConfig,
        status::{DispatchOutcome, PreparationOutcome},
    },
    utils::retry_with_backoff,
};

/// Drives the preparation segment for one notification: snapshot first,
/// trigger dispatch second, each as an independently retryable unit of work.
///
/// Steps receive only their explicit inputs, never state carried from a
/// prior step, so a re-delivered request replays safely after a restart.
pub struct PrepareCoordinator {
    snapshot_writer: SnapshotWriter,
    trigger_dispatcher: TriggerDispatcher,
    step_retry: RetryConfig,
}

impl PrepareCoordinator {
    pub fn new(
        snapshot_writer: SnapshotWriter,
        trigger_dispatcher: TriggerDispatcher,
        step_retry: RetryConfig,
    ) -> Self {
        Self {
            snapshot_writer,
            trigger_dispatcher,
            step_retry,
        }
    }

    pub async fn run(
        &self,
        notification: &NotificationDefinition,
    ) -> Result<PreparationOutcome, Error> {
        // A failed snapshot aborts the segment: without it nothing
        // downstream can send.
        retry_with_backoff(&self.step_retry, || {
            self.snapshot_writer.prepare_snapshot(notification)
        })
        .await?;

        debug!(notification_id = %notification.id, "Snapshot step complete");

        let outcome = retry_with_backoff(&self.step_retry, || {
            self.trigger_dispatcher
                .dispatch_trigger(&notification.id, &notification.recipient_batches)
        })
        .await?;

        match outcome {
            DispatchOutcome::Dispatched => {
                info!(notification_id = %notification.id, "Trigger dispatched");
                Ok(PreparationOutcome::TriggerDispatched)
            }
            DispatchOutcome::FailureAnnotated(reason) => {
                info!(
                    notification_id = %notification.id,
                    reason = %reason,
                    "Trigger failure annotated, segment still complete"
                );
                Ok(PreparationOutcome::TriggerFailedAnnotated { reason })
            }
        }
    }
}
