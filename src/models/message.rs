use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::notification::NotificationDefinition;

/// Wrapper around payloads consumed from the prepare queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub data: NotificationDefinition,
}

/// Bounded payload handed from the dispatch step to the inner queue-send
/// unit. Recipient payloads are never forwarded; the downstream stage
/// retrieves them independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchRequest {
    pub notification_id: String,
    pub total_recipient_count: u64,
}

/// Prepare request that exhausted its step retries, parked on the failed
/// queue with its failure context instead of being silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqMessage {
    pub original_payload: String,
    pub failure_reason: String,
    pub failed_at: String,
}

/// Wire form of the trigger submitted to the data queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQueueMessage {
    pub notification_id: String,
    pub initial_send_date: DateTime<Utc>,
    pub total_message_count: u64,
}
