use serde::{Deserialize, Serialize};

/// Partition key under which every sending snapshot is stored.
pub const SENDING_NOTIFICATIONS_PARTITION: &str = "sending-notifications";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDefinition {
    pub id: String,
    pub title: String,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub image_link: Option<String>,

    #[serde(default)]
    pub button_title: Option<String>,

    #[serde(default)]
    pub button_link: Option<String>,

    #[serde(default)]
    pub recipient_batches: Vec<Vec<Recipient>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub user_id: String,

    #[serde(default)]
    pub conversation_id: Option<String>,

    #[serde(default)]
    pub service_url: Option<String>,

    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Immutable rendered copy of a notification, keyed by the fixed sending
/// partition and the notification's own id as row key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendingSnapshot {
    pub partition_key: String,
    pub row_key: String,
    pub notification_id: String,
    pub content: String,
}

impl SendingSnapshot {
    pub fn new(notification_id: &str, content: String) -> Self {
        Self {
            partition_key: SENDING_NOTIFICATIONS_PARTITION.to_string(),
            row_key: notification_id.to_string(),
            notification_id: notification_id.to_string(),
            content,
        }
    }
}
