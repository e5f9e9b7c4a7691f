use std::sync::Arc;

use tokio::time::{timeout, Duration};

use supportline_core::error::{Result, SupportlineError};
use supportline_core::protocol::{ChatMessage, ServerEvent};

use crate::auth::Identity;
use crate::obs::metrics::GatewayMetrics;
use crate::realtime::core::presence::PresencePublisher;
use crate::realtime::core::registry::ConnectionRegistry;
use crate::realtime::types::{Prepared, QoS};
use crate::store::MessageStore;

/// Message router: persist first, then forward to whoever is online.
///
/// The store is the durable copy; wire delivery is best-effort on top of it.
/// An offline recipient, a full queue, or a slow consumer never fails the
/// send from the sender's point of view.
pub struct ChatCore {
    registry: Arc<ConnectionRegistry>,
    presence: PresencePublisher,
    store: Arc<dyn MessageStore>,
    deliver_timeout_ms: u64,
    metrics: Arc<GatewayMetrics>,
}

impl ChatCore {
    pub fn new(
        store: Arc<dyn MessageStore>,
        metrics: Arc<GatewayMetrics>,
        deliver_timeout_ms: u64,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let presence = PresencePublisher::new(Arc::clone(&registry));
        Self {
            registry,
            presence,
            store,
            deliver_timeout_ms,
            metrics,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn presence(&self) -> &PresencePublisher {
        &self.presence
    }

    fn reliable(&self) -> QoS {
        QoS::Reliable {
            timeout_ms: self.deliver_timeout_ms,
        }
    }

    /// Handle `send-message`: validate, persist, ack the sender, forward to
    /// the recipient if online. Returns the stored record.
    pub async fn send_message(
        &self,
        sender: &Identity,
        receiver_id: &str,
        body: &str,
    ) -> Result<ChatMessage> {
        let body = body.trim();
        if body.is_empty() {
            return Err(SupportlineError::BadRequest(
                "message must not be empty".into(),
            ));
        }
        if receiver_id.is_empty() {
            return Err(SupportlineError::BadRequest(
                "receiver_id must not be empty".into(),
            ));
        }

        let stored = self.store.append(sender, receiver_id, body).await?;
        self.metrics.messages_persisted.inc(&[]);
        tracing::debug!(id = stored.id, from = %stored.sender_id, to = %stored.receiver_id, "message persisted");

        self.deliver(
            &sender.user_id,
            &ServerEvent::MessageSent(stored.clone()),
            self.reliable(),
        )
        .await?;
        self.deliver(
            receiver_id,
            &ServerEvent::ReceiveMessage(stored.clone()),
            self.reliable(),
        )
        .await?;

        Ok(stored)
    }

    /// Handle `mark-read`: flip unread messages from `sender_id` to the
    /// reader, then notify the sender (lossy) so read receipts can render.
    pub async fn mark_read(&self, reader: &Identity, sender_id: &str) -> Result<u64> {
        let count = self.store.mark_read(sender_id, &reader.user_id).await?;
        if count > 0 {
            self.metrics.read_receipts.inc(&[]);
            self.deliver(
                sender_id,
                &ServerEvent::MessagesRead {
                    reader_id: reader.user_id.clone(),
                    count,
                },
                QoS::Lossy,
            )
            .await?;
        }
        Ok(count)
    }

    /// Relay a typing indicator. Ephemeral: nothing is persisted, offline
    /// recipients are skipped entirely.
    pub async fn typing(&self, from: &Identity, receiver_id: &str, started: bool) -> Result<()> {
        let ev = if started {
            ServerEvent::UserTyping {
                user_id: from.user_id.clone(),
            }
        } else {
            ServerEvent::UserStopTyping {
                user_id: from.user_id.clone(),
            }
        };
        self.deliver(receiver_id, &ev, QoS::Lossy).await
    }

    /// Deliver one event to one user per the QoS strategy. Offline,
    /// timed-out, and closed recipients are recorded but never fail the
    /// caller; the persisted record is the durable copy.
    async fn deliver(&self, user_id: &str, ev: &ServerEvent, qos: QoS) -> Result<()> {
        let Some(conn) = self.registry.get(user_id) else {
            if matches!(qos, QoS::Reliable { .. }) {
                self.metrics.deliveries.inc(&[("outcome", "offline")]);
            }
            return Ok(());
        };

        let prepared = Prepared::prepare(ev)?;
        match qos {
            QoS::Lossy => {
                let _ = conn.tx.try_send(prepared.to_ws_message());
            }
            QoS::Reliable { timeout_ms } => {
                let deadline = Duration::from_millis(timeout_ms);
                match timeout(deadline, conn.tx.send(prepared.to_ws_message())).await {
                    Ok(Ok(())) => {
                        self.metrics.deliveries.inc(&[("outcome", "sent")]);
                    }
                    Ok(Err(_)) => {
                        self.metrics.deliveries.inc(&[("outcome", "closed")]);
                        tracing::debug!(%user_id, "delivery skipped: session closing");
                    }
                    Err(_) => {
                        self.metrics.deliveries.inc(&[("outcome", "timeout")]);
                        tracing::warn!(%user_id, "delivery timed out; recipient has the persisted copy");
                    }
                }
            }
        }
        Ok(())
    }
}
