use anyhow::{Error, Result};
use chrono::{SecondsFormat, Utc};
use tokio::time::{Duration, sleep};
use tracing::{debug, error, info, warn};

use crate::{
    activities::DeadLetterQueue,
    coordinator::PrepareCoordinator,
    models::{
        message::{DlqMessage, Envelope},
        retry::RetryConfig,
    },
};

/// Entry point for one prepare request pulled off the queue. Drives the
/// two-step preparation through the coordinator; a request that fails is
/// parked on the failed queue with its failure context before the error is
/// handed back to the consume loop.
pub async fn process_prepare_request(
    payload: &str,
    coordinator: &PrepareCoordinator,
    dlq: &dyn DeadLetterQueue,
) -> Result<(), Error> {
    match run_prepare_request(payload, coordinator).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let dlq_message = DlqMessage {
                original_payload: payload.to_string(),
                failure_reason: e.to_string(),
                failed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            };

            if let Err(publish_err) = dlq.publish(&dlq_message).await {
                warn!(error = %publish_err, "Failed to publish message to dlq");
            }

            Err(e)
        }
    }
}

async fn run_prepare_request(
    payload: &str,
    coordinator: &PrepareCoordinator,
) -> Result<(), Error> {
    let request_id = uuid::Uuid::new_v4();

    let enveloped = serde_json::from_str::<Envelope>(payload)?;
    let notification = enveloped.data;

    info!(
        request_id = %request_id,
        notification_id = %notification.id,
        batch_count = notification.recipient_batches.len(),
        "Processing prepare request"
    );

    match coordinator.run(&notification).await {
        Ok(outcome) => {
            info!(
                notification_id = %notification.id,
                outcome = %outcome,
                "Preparation segment complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(
                notification_id = %notification.id,
                error = %e,
                "Preparation segment aborted"
            );
            Err(e)
        }
    }
}

pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        attempt,
                        max_attempts = config.max_attempts,
                        "Retry succeeded"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= config.max_attempts {
                    warn!(
                        max_attempts = config.max_attempts,
                        error = %e,
                        "Retry failed after exhausting all attempts"
                    );
                    return Err(e);
                }

                debug!(
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms,
                    "Retry attempt failed, backing off"
                );

                let jitter = rand::random_range(-0.1..=0.1);

                let jittered_delay = (delay_ms as f64 * (1.0 + jitter)) as u64;

                sleep(Duration::from_millis(jittered_delay)).await;

                delay_ms = std::cmp::min(delay_ms * config.backoff_multiplier, config.max_delay_ms);
            }
        }
    }
}
