//! Realtime runtime for the Supportline gateway.
//!
//! Registry + presence + QoS-based delivery helpers.

pub mod core;
pub mod types;

pub use self::core::{ChatCore, Connection, ConnectionRegistry, PresencePublisher};
pub use types::{Prepared, QoS};
