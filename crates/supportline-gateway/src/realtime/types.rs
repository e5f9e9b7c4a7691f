use axum::extract::ws::Message;

use supportline_core::error::Result;
use supportline_core::protocol::ServerEvent;

/// Quality-of-Service strategy for outgoing delivery.
#[derive(Debug, Clone)]
pub enum QoS {
    /// Latency-critical ephemera (typing, presence): do not await; if the
    /// recipient's queue is full, drop.
    Lossy,
    /// Reliability-critical (message delivery and acks): attempt delivery and
    /// time out rather than block the router on a slow consumer.
    Reliable { timeout_ms: u64 },
}

impl Default for QoS {
    fn default() -> Self {
        QoS::Lossy
    }
}

/// Event serialized once, sent N times (presence broadcasts fan out to every
/// connection).
#[derive(Debug, Clone)]
pub struct Prepared(String);

impl Prepared {
    pub fn prepare(ev: &ServerEvent) -> Result<Self> {
        Ok(Prepared(ev.encode()?))
    }

    /// Convert to an axum WS message for transport.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.0.clone())
    }
}
