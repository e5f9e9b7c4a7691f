//! Persistence seam for chat messages.
//!
//! The router persists before it forwards, so the store is the durable copy
//! for offline recipients. The in-memory backend covers development and
//! tests; a database-backed implementation plugs in behind `MessageStore`.

pub mod memory;

use async_trait::async_trait;

use supportline_core::error::Result;
use supportline_core::protocol::ChatMessage;

use crate::auth::Identity;

pub use memory::MemoryStore;

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message and return the stored record (id and timestamp
    /// assigned by the store, `read` false).
    async fn append(&self, sender: &Identity, receiver_id: &str, body: &str) -> Result<ChatMessage>;

    /// Flip every unread message from `sender_id` to `receiver_id` to read.
    /// Returns the number of records changed.
    async fn mark_read(&self, sender_id: &str, receiver_id: &str) -> Result<u64>;

    /// Unread messages addressed to `receiver_id`, across all senders.
    async fn unread_count(&self, receiver_id: &str) -> Result<u64>;
}
