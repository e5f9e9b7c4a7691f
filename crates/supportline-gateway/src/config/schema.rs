use serde::Deserialize;
use supportline_core::error::{Result, SupportlineError};

use crate::auth::Role;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub auth: AuthSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SupportlineError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.auth.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Per-session outbound queue depth. Lossy deliveries are dropped when
    /// the queue is full.
    #[serde(default = "default_send_queue_depth")]
    pub send_queue_depth: usize,

    /// Per-recipient timeout for reliable deliveries (acks and messages).
    #[serde(default = "default_deliver_timeout_ms")]
    pub deliver_timeout_ms: u64,

    /// Inbound frames larger than this are rejected before decode.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            send_queue_depth: default_send_queue_depth(),
            deliver_timeout_ms: default_deliver_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(SupportlineError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(SupportlineError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(SupportlineError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(16..=65536).contains(&self.send_queue_depth) {
            return Err(SupportlineError::BadRequest(
                "gateway.send_queue_depth must be between 16 and 65536".into(),
            ));
        }
        if !(100..=30000).contains(&self.deliver_timeout_ms) {
            return Err(SupportlineError::BadRequest(
                "gateway.deliver_timeout_ms must be between 100 and 30000".into(),
            ));
        }
        if !(256..=1_048_576).contains(&self.max_frame_bytes) {
            return Err(SupportlineError::BadRequest(
                "gateway.max_frame_bytes must be between 256 and 1048576".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_send_queue_depth() -> usize {
    1024
}
fn default_deliver_timeout_ms() -> u64 {
    1500
}
fn default_max_frame_bytes() -> usize {
    4096
}

/// Static token table for the built-in auth backend.
///
/// Production deployments are expected to swap in an external verifier behind
/// `AuthService`; this section only feeds `StaticTokenAuth`.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    #[serde(default)]
    pub tokens: Vec<StaticToken>,
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        for t in &self.tokens {
            if t.token.is_empty() || t.user_id.is_empty() {
                return Err(SupportlineError::BadRequest(
                    "auth.tokens entries require non-empty token and user_id".into(),
                ));
            }
        }
        let mut tokens: Vec<&str> = self.tokens.iter().map(|t| t.token.as_str()).collect();
        tokens.sort_unstable();
        tokens.dedup();
        if tokens.len() != self.tokens.len() {
            return Err(SupportlineError::BadRequest(
                "auth.tokens must not contain duplicate tokens".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticToken {
    pub token: String,
    pub user_id: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::User
}
