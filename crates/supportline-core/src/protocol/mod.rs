//! Chat-support wire protocol (JSON text frames).
//!
//! One event per WebSocket text frame, adjacently tagged:
//! `{ "event": "send-message", "data": { ... } }`. Event names mirror the
//! support frontend verbatim (`send-message`, `mark-read`, `user-online`, ...).
//!
//! All parsers are panic-free: malformed input is reported as
//! `SupportlineError` instead of panicking, keeping the gateway resilient to
//! hostile traffic.

pub mod events;

pub use events::{ChatMessage, ClientEvent, ServerEvent};
