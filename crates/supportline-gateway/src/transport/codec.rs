//! Decode-once codec for the transport layer.
//!
//! - Text frames => `ClientEvent`
//! - Binary frames are rejected (the protocol is JSON text only)
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use supportline_core::{
    error::{Result, SupportlineError},
    protocol::ClientEvent,
};

#[derive(Debug)]
pub enum Inbound {
    Event { ev: ClientEvent, bytes_len: usize },
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

/// Cheap frame length, computed before decode so size limits apply first.
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.as_bytes().len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let bytes_len = s.as_bytes().len();
            let ev = ClientEvent::decode(&s)?;
            Ok(Inbound::Event { ev, bytes_len })
        }
        Message::Binary(_) => Err(SupportlineError::BadRequest(
            "binary frames are not supported".into(),
        )),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(v) => Ok(Inbound::Pong(v)),
        Message::Close(_) => Ok(Inbound::Close),
    }
}
