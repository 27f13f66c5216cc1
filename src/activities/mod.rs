pub mod dispatch;
pub mod snapshot;

use anyhow::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    message::DlqMessage,
    notification::{NotificationDefinition, SendingSnapshot},
};

/// External card templating collaborator. Returns the serialized card
/// document for a notification's current state.
#[async_trait]
pub trait ContentRenderer: Send + Sync {
    async fn render(&self, notification: &NotificationDefinition) -> Result<String, Error>;
}

/// Durable store holding sending snapshots. The upsert must be idempotent
/// (last write wins) because steps are re-executed under at-least-once retry.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn upsert(&self, snapshot: &SendingSnapshot) -> Result<(), Error>;
}

/// Metadata record of the notification, used only to attach failure
/// annotations on the dispatch step's catch path.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn append_failure(&self, notification_id: &str, message: &str) -> Result<(), Error>;
}

/// Delivery queue accepting a serialized trigger that must stay invisible
/// to consumers until `visible_at`.
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    async fn submit(&self, payload: &[u8], visible_at: DateTime<Utc>) -> Result<(), Error>;
}

/// Parking spot for prepare requests that exhausted their retries.
#[async_trait]
pub trait DeadLetterQueue: Send + Sync {
    async fn publish(&self, message: &DlqMessage) -> Result<(), Error>;
}
