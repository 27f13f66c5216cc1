#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicU32, Ordering},
    },
};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prepare_service::{
    activities::{ContentRenderer, DeadLetterQueue, DeliveryQueue, MetadataStore, SnapshotStore},
    models::{
        message::DlqMessage,
        notification::{NotificationDefinition, Recipient, SendingSnapshot},
    },
};

pub fn notification_with_batches(id: &str, batch_sizes: &[usize]) -> NotificationDefinition {
    let recipient_batches = batch_sizes
        .iter()
        .enumerate()
        .map(|(batch_index, size)| {
            (0..*size)
                .map(|i| Recipient {
                    user_id: format!("user_{}_{}", batch_index, i),
                    conversation_id: None,
                    service_url: None,
                    tenant_id: None,
                })
                .collect()
        })
        .collect();

    NotificationDefinition {
        id: id.to_string(),
        title: format!("Broadcast {}", id),
        summary: Some("Quarterly update".to_string()),
        author: Some("Comms Team".to_string()),
        image_link: None,
        button_title: None,
        button_link: None,
        recipient_batches,
    }
}

/// Renderer returning a canned card document, failing the first
/// `fail_times` calls.
pub struct StubRenderer {
    pub output: Mutex<String>,
    fail_times: AtomicU32,
    pub calls: AtomicU32,
}

impl StubRenderer {
    pub fn returning(output: &str) -> Self {
        Self {
            output: Mutex::new(output.to_string()),
            fail_times: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing_times(output: &str, fail_times: u32) -> Self {
        Self {
            output: Mutex::new(output.to_string()),
            fail_times: AtomicU32::new(fail_times),
            calls: AtomicU32::new(0),
        }
    }

    pub fn set_output(&self, output: &str) {
        *self.output.lock().unwrap() = output.to_string();
    }
}

#[async_trait]
impl ContentRenderer for StubRenderer {
    async fn render(&self, _notification: &NotificationDefinition) -> Result<String, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self
            .fail_times
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(anyhow!("Card render unavailable"));
        }

        Ok(self.output.lock().unwrap().clone())
    }
}

/// Snapshot store backed by a map keyed like the real table, failing the
/// first `fail_times` upserts.
pub struct InMemorySnapshotStore {
    pub records: Mutex<HashMap<(String, String), SendingSnapshot>>,
    fail_times: AtomicU32,
    pub upsert_calls: AtomicU32,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(fail_times: u32) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_times: AtomicU32::new(fail_times),
            upsert_calls: AtomicU32::new(0),
        }
    }

    pub fn get(&self, partition_key: &str, row_key: &str) -> Option<SendingSnapshot> {
        self.records
            .lock()
            .unwrap()
            .get(&(partition_key.to_string(), row_key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn upsert(&self, snapshot: &SendingSnapshot) -> Result<(), Error> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        if self
            .fail_times
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(anyhow!("Snapshot store unavailable"));
        }

        self.records.lock().unwrap().insert(
            (snapshot.partition_key.clone(), snapshot.row_key.clone()),
            snapshot.clone(),
        );

        Ok(())
    }
}

pub struct InMemoryMetadataStore {
    pub failures: Mutex<Vec<(String, String)>>,
    reject_writes: bool,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            failures: Mutex::new(Vec::new()),
            reject_writes: false,
        }
    }

    pub fn rejecting_writes() -> Self {
        Self {
            failures: Mutex::new(Vec::new()),
            reject_writes: true,
        }
    }

    pub fn recorded(&self) -> Vec<(String, String)> {
        self.failures.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn append_failure(&self, notification_id: &str, message: &str) -> Result<(), Error> {
        if self.reject_writes {
            return Err(anyhow!("Metadata store unavailable"));
        }

        self.failures
            .lock()
            .unwrap()
            .push((notification_id.to_string(), message.to_string()));

        Ok(())
    }
}

/// Queue capturing submissions, failing the first `fail_times` submits.
pub struct FakeDeliveryQueue {
    pub submissions: Mutex<Vec<(Vec<u8>, DateTime<Utc>)>>,
    fail_times: AtomicU32,
}

impl FakeDeliveryQueue {
    pub fn new() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(fail_times: u32) -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            fail_times: AtomicU32::new(fail_times),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_times(u32::MAX)
    }

    pub fn captured(&self) -> Vec<(Vec<u8>, DateTime<Utc>)> {
        self.submissions.lock().unwrap().clone()
    }
}

/// Dead-letter sink capturing parked requests.
pub struct FakeDeadLetterQueue {
    pub messages: Mutex<Vec<DlqMessage>>,
    reject_publishes: bool,
}

impl FakeDeadLetterQueue {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            reject_publishes: false,
        }
    }

    pub fn rejecting_publishes() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            reject_publishes: true,
        }
    }

    pub fn captured(&self) -> Vec<DlqMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeadLetterQueue for FakeDeadLetterQueue {
    async fn publish(&self, message: &DlqMessage) -> Result<(), Error> {
        if self.reject_publishes {
            return Err(anyhow!("Failed queue unavailable"));
        }

        self.messages.lock().unwrap().push(message.clone());

        Ok(())
    }
}

#[async_trait]
impl DeliveryQueue for FakeDeliveryQueue {
    async fn submit(&self, payload: &[u8], visible_at: DateTime<Utc>) -> Result<(), Error> {
        if self
            .fail_times
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(anyhow!("Queue submission refused"));
        }

        self.submissions
            .lock()
            .unwrap()
            .push((payload.to_vec(), visible_at));

        Ok(())
    }
}
