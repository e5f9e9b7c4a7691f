//! Client/server event definitions.
//!
//! Both directions share the same envelope shape: an `event` tag and a `data`
//! payload. `ClientEvent` is what the gateway decodes from inbound frames;
//! `ServerEvent` is what it encodes for delivery.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SupportlineError};

/// A persisted chat message, as delivered over the wire.
///
/// `created_at` is unix epoch milliseconds. `read` reflects the stored state
/// at the time the record was serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub sender_id: String,
    pub sender_name: String,
    pub receiver_id: String,
    pub message: String,
    pub read: bool,
    pub created_at: u64,
}

/// Inbound events (client -> gateway).
///
/// `authenticate` must be the first event on a connection; everything else is
/// rejected until the session is registered.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case", deny_unknown_fields)]
pub enum ClientEvent {
    Authenticate { token: String },
    SendMessage { receiver_id: String, message: String },
    MarkRead { sender_id: String },
    Typing { receiver_id: String },
    StopTyping { receiver_id: String },
}

impl ClientEvent {
    /// Decode a text frame. Malformed JSON and unknown event names surface as
    /// `BadRequest` so the session loop can answer with an `error` event
    /// instead of dropping the connection.
    pub fn decode(frame: &str) -> Result<Self> {
        serde_json::from_str(frame)
            .map_err(|e| SupportlineError::BadRequest(format!("invalid event json: {e}")))
    }
}

/// Outbound events (gateway -> client).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Authenticated {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Ack to the sender carrying the stored record.
    MessageSent(ChatMessage),
    /// Delivery to the recipient carrying the stored record.
    ReceiveMessage(ChatMessage),
    /// Read receipt: `reader_id` has read `count` messages from the target.
    MessagesRead { reader_id: String, count: u64 },
    UserTyping { user_id: String },
    UserStopTyping { user_id: String },
    UserOnline { user_id: String },
    UserOffline { user_id: String },
    Error { code: String, msg: String },
}

impl ServerEvent {
    /// Serialize to a text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SupportlineError::Internal(format!("event encode failed: {e}")))
    }

    /// Build an `error` event from a gateway error.
    pub fn from_error(err: &SupportlineError) -> Self {
        ServerEvent::Error {
            code: err.client_code().as_str().to_string(),
            msg: err.to_string(),
        }
    }
}
