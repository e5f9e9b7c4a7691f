use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use supportline_core::error::{Result, SupportlineError};
use supportline_core::protocol::ChatMessage;

use crate::auth::Identity;
use crate::store::MessageStore;

/// In-memory message store. Records live in insertion order; ids are
/// monotonic per process.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ChatMessage>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, sender: &Identity, receiver_id: &str, body: &str) -> Result<ChatMessage> {
        let record = ChatMessage {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            sender_id: sender.user_id.clone(),
            sender_name: sender.name.clone(),
            receiver_id: receiver_id.to_string(),
            message: body.to_string(),
            read: false,
            created_at: Self::now_millis(),
        };

        let mut records = self
            .records
            .lock()
            .map_err(|_| SupportlineError::Storage("message store poisoned".into()))?;
        records.push(record.clone());
        Ok(record)
    }

    async fn mark_read(&self, sender_id: &str, receiver_id: &str) -> Result<u64> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| SupportlineError::Storage("message store poisoned".into()))?;

        let mut count = 0;
        for m in records.iter_mut() {
            if !m.read && m.sender_id == sender_id && m.receiver_id == receiver_id {
                m.read = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn unread_count(&self, receiver_id: &str) -> Result<u64> {
        let records = self
            .records
            .lock()
            .map_err(|_| SupportlineError::Storage("message store poisoned".into()))?;
        Ok(records
            .iter()
            .filter(|m| !m.read && m.receiver_id == receiver_id)
            .count() as u64)
    }
}
