//! Realtime core components for the Supportline gateway.
//!
//! Connection registry, presence publisher, and the message router shared by
//! every session.

mod chat;
mod presence;
mod registry;

pub use chat::ChatCore;
pub use presence::PresencePublisher;
pub use registry::{Connection, ConnectionRegistry};
