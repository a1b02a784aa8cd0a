//! In-memory collaborators for pipeline and scheduler tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use autosend_core::{
    AutosendError, DeliveryCache, DeliveryRecord, MessageStatus, MessageStore, PendingMessage,
    Result, Transport,
};
use chrono::Utc;

/// Store keeping rows in insertion order; claims flip `waiting` → `pending`.
pub struct MemoryStore {
    rows: Mutex<Vec<PendingMessage>>,
    claim_calls: AtomicUsize,
    sent_order: Mutex<Vec<String>>,
    fail_claim: bool,
    fail_mark_sent: Option<String>,
}

impl MemoryStore {
    pub fn with_waiting(ids: &[&str]) -> Self {
        let now = Utc::now();
        let rows = ids
            .iter()
            .map(|id| PendingMessage {
                id: id.to_string(),
                recipient: format!("+90555{id}"),
                content: format!("content of {id}"),
                status: MessageStatus::Waiting,
                created_at: now,
                updated_at: now,
            })
            .collect();
        Self {
            rows: Mutex::new(rows),
            claim_calls: AtomicUsize::new(0),
            sent_order: Mutex::new(Vec::new()),
            fail_claim: false,
            fail_mark_sent: None,
        }
    }

    pub fn failing_claim(mut self) -> Self {
        self.fail_claim = true;
        self
    }

    pub fn failing_mark_sent(mut self, id: &str) -> Self {
        self.fail_mark_sent = Some(id.to_string());
        self
    }

    pub fn status(&self, id: &str) -> MessageStatus {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.status)
            .unwrap_or_else(|| panic!("no message {id}"))
    }

    pub fn claim_calls(&self) -> usize {
        self.claim_calls.load(Ordering::SeqCst)
    }

    pub fn sent_order(&self) -> Vec<String> {
        self.sent_order.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn claim_pending(&self, limit: usize) -> Result<Vec<PendingMessage>> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_claim {
            return Err(AutosendError::Store("claim transaction aborted".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        let claimed = rows
            .iter_mut()
            .filter(|m| m.status == MessageStatus::Waiting)
            .take(limit)
            .map(|m| {
                m.status = MessageStatus::Pending;
                m.clone()
            })
            .collect();
        Ok(claimed)
    }

    async fn set_status(&self, id: &str, status: MessageStatus) -> Result<()> {
        if status == MessageStatus::Sent && self.fail_mark_sent.as_deref() == Some(id) {
            return Err(AutosendError::Store(format!("update of {id} timed out")));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| AutosendError::Store(format!("message {id} not found")))?;
        row.status = status;
        if status == MessageStatus::Sent {
            self.sent_order.lock().unwrap().push(id.to_string());
        }
        Ok(())
    }
}

/// Transport that acknowledges every message as `delivery-{id}`, optionally
/// failing on one ID or taking a fixed time per delivery.
pub struct ScriptedTransport {
    fail_on: Option<String>,
    delay: Option<Duration>,
    attempted: Mutex<Vec<String>>,
    delivered: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            fail_on: None,
            delay: None,
            attempted: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_on(mut self, id: &str) -> Self {
        self.fail_on = Some(id.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn deliver(&self, message: &PendingMessage) -> Result<DeliveryRecord> {
        self.attempted.lock().unwrap().push(message.id.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.as_deref() == Some(message.id.as_str()) {
            return Err(AutosendError::Transport(format!(
                "unexpected response code 500 for {}",
                message.id
            )));
        }
        self.delivered.lock().unwrap().push(message.id.clone());
        Ok(DeliveryRecord {
            message: "Accepted".into(),
            delivery_id: format!("delivery-{}", message.id),
            sent_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Cache keeping records in write order.
pub struct MemoryCache {
    records: Mutex<Vec<DeliveryRecord>>,
    fail_on: Option<String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    pub fn fail_on(mut self, delivery_id: &str) -> Self {
        self.fail_on = Some(delivery_id.to_string());
        self
    }

    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn delivery_ids(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.delivery_id).collect()
    }
}

#[async_trait]
impl DeliveryCache for MemoryCache {
    async fn record(&self, record: &DeliveryRecord) -> Result<()> {
        if self.fail_on.as_deref() == Some(record.delivery_id.as_str()) {
            return Err(AutosendError::Cache(
                "READONLY You can't write against a read only replica".into(),
            ));
        }
        let mut records = self.records.lock().unwrap();
        records.retain(|r| r.delivery_id != record.delivery_id);
        records.push(record.clone());
        Ok(())
    }
}
