use std::sync::Arc;

use supportline_core::error::Result;
use supportline_core::protocol::ServerEvent;

use crate::realtime::core::registry::{Connection, ConnectionRegistry};
use crate::realtime::types::Prepared;

/// Presence publisher. Online/offline is derived solely from registry
/// membership; this type only fans the transitions out.
///
/// All presence traffic is lossy: a peer with a full queue misses the event
/// rather than stalling the transition.
pub struct PresencePublisher {
    registry: Arc<ConnectionRegistry>,
}

impl PresencePublisher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Broadcast `user-online` to every other connection.
    pub fn publish_online(&self, user_id: &str) -> Result<()> {
        tracing::debug!(%user_id, "presence: online");
        self.fan_out(user_id, &ServerEvent::UserOnline { user_id: user_id.to_string() })
    }

    /// Broadcast `user-offline` to every other connection.
    pub fn publish_offline(&self, user_id: &str) -> Result<()> {
        tracing::debug!(%user_id, "presence: offline");
        self.fan_out(user_id, &ServerEvent::UserOffline { user_id: user_id.to_string() })
    }

    /// Catch a late joiner up: send `user-online` for every peer already
    /// registered. Clients build their online set purely from these events.
    pub fn snapshot_to(&self, user_id: &str, conn: &Connection) -> Result<()> {
        for (peer, _) in self.registry.peers_of(user_id) {
            let prepared = Prepared::prepare(&ServerEvent::UserOnline { user_id: peer })?;
            let _ = conn.tx.try_send(prepared.to_ws_message());
        }
        Ok(())
    }

    fn fan_out(&self, exclude: &str, ev: &ServerEvent) -> Result<()> {
        let prepared = Prepared::prepare(ev)?;
        for (_, conn) in self.registry.peers_of(exclude) {
            let _ = conn.tx.try_send(prepared.to_ws_message());
        }
        Ok(())
    }
}
