use std::sync::Arc;

use anyhow::{Error, Result};
use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::{
    activities::{DeliveryQueue, MetadataStore},
    models::{
        message::{DataQueueMessage, DispatchRequest},
        notification::Recipient,
        status::DispatchOutcome,
    },
};

/// Emits the delayed trigger that starts the downstream fan-out.
///
/// Failure policy is the inverse of the snapshot step: any serialization or
/// submission fault is caught locally, recorded on the notification's
/// metadata, and the step still reports success. Letting the fault escape
/// would retry a step whose annotation side effect is not undone.
pub struct TriggerDispatcher {
    queue: Arc<dyn DeliveryQueue>,
    metadata_store: Arc<dyn MetadataStore>,
    send_delay: Duration,
}

impl TriggerDispatcher {
    pub fn new(
        queue: Arc<dyn DeliveryQueue>,
        metadata_store: Arc<dyn MetadataStore>,
        send_delay_seconds: i64,
    ) -> Self {
        Self {
            queue,
            metadata_store,
            send_delay: Duration::seconds(send_delay_seconds),
        }
    }

    pub async fn dispatch_trigger(
        &self,
        notification_id: &str,
        recipient_batches: &[Vec<Recipient>],
    ) -> Result<DispatchOutcome, Error> {
        // Advisory count for downstream progress tracking; tolerates empty
        // and unevenly sized batches.
        let total_recipient_count = recipient_batches
            .iter()
            .map(|batch| batch.len() as u64)
            .sum();

        let request = DispatchRequest {
            notification_id: notification_id.to_string(),
            total_recipient_count,
        };

        match self.send_trigger(&request).await {
            Ok(()) => {
                info!(
                    notification_id = %request.notification_id,
                    total_recipient_count = request.total_recipient_count,
                    "Dispatch trigger submitted"
                );
                Ok(DispatchOutcome::Dispatched)
            }
            Err(e) => {
                let reason = e.to_string();

                warn!(
                    notification_id = %request.notification_id,
                    error = %reason,
                    "Trigger dispatch failed, annotating notification metadata"
                );

                self.metadata_store
                    .append_failure(&request.notification_id, &reason)
                    .await?;

                Ok(DispatchOutcome::FailureAnnotated(reason))
            }
        }
    }

    /// Inner unit of work: build the trigger, serialize it, submit it with
    /// the scheduled visibility delay.
    async fn send_trigger(&self, request: &DispatchRequest) -> Result<(), Error> {
        let now = Utc::now();

        let message = DataQueueMessage {
            notification_id: request.notification_id.clone(),
            initial_send_date: now,
            total_message_count: request.total_recipient_count,
        };

        let payload = serde_json::to_vec(&message)?;

        self.queue.submit(&payload, now + self.send_delay).await
    }
}
