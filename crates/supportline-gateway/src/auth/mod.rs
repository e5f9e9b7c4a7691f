//! Auth seam (opaque token -> identity).
//!
//! The gateway never inspects tokens itself; it hands them to an
//! `AuthService`. The built-in `StaticTokenAuth` resolves tokens from the
//! config table, which is enough for development and tests. Production wires
//! in an external verifier.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use supportline_core::error::{Result, SupportlineError};

use crate::config::AuthSection;

/// Role of an authenticated principal. The support chat is user <-> admin;
/// the admin side sees every conversation, users only see theirs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Resolved identity for a connected session.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

/// Opaque-token verifier.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity>;
}

/// Token table backed by the `auth` config section.
pub struct StaticTokenAuth {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenAuth {
    pub fn from_config(auth: &AuthSection) -> Self {
        let tokens = auth
            .tokens
            .iter()
            .map(|t| {
                (
                    t.token.clone(),
                    Identity {
                        user_id: t.user_id.clone(),
                        name: t.name.clone(),
                        role: t.role,
                    },
                )
            })
            .collect();
        Self { tokens }
    }

    pub fn shared(auth: &AuthSection) -> Arc<dyn AuthService> {
        Arc::new(Self::from_config(auth))
    }
}

#[async_trait]
impl AuthService for StaticTokenAuth {
    async fn verify(&self, token: &str) -> Result<Identity> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(SupportlineError::AuthFailed)
    }
}
