//! Shared application state for the Supportline gateway.
//!
//! Wires config, the auth seam, the message store, and the chat router into
//! one cloneable handle. Startup errors are explicit (Result instead of
//! panic).

use std::sync::Arc;

use supportline_core::error::Result;

use crate::auth::{AuthService, StaticTokenAuth};
use crate::config::GatewayConfig;
use crate::obs::metrics::GatewayMetrics;
use crate::realtime::ChatCore;
use crate::store::{MemoryStore, MessageStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    auth: Arc<dyn AuthService>,
    chat: Arc<ChatCore>,
    metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Build application state with the built-in backends (static token
    /// auth, in-memory store).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let auth = StaticTokenAuth::shared(&cfg.auth);
        let store: Arc<dyn MessageStore> = Arc::new(MemoryStore::new());
        Self::with_parts(cfg, auth, store)
    }

    /// Build application state around externally provided collaborators.
    pub fn with_parts(
        cfg: GatewayConfig,
        auth: Arc<dyn AuthService>,
        store: Arc<dyn MessageStore>,
    ) -> Result<Self> {
        let metrics = Arc::new(GatewayMetrics::default());
        let chat = Arc::new(ChatCore::new(
            store,
            Arc::clone(&metrics),
            cfg.gateway.deliver_timeout_ms,
        ));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                auth,
                chat,
                metrics,
            }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.inner.auth
    }

    pub fn chat(&self) -> &Arc<ChatCore> {
        &self.inner.chat
    }

    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.inner.metrics
    }
}
