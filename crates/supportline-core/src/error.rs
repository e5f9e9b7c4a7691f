//! Shared error type across Supportline crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed event.
    BadRequest,
    /// Auth failed.
    AuthFailed,
    /// Addressed user does not exist.
    UnknownUser,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Persistence layer failure.
    Storage,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::UnknownUser => "UNKNOWN_USER",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Storage => "STORAGE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SupportlineError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum SupportlineError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("storage: {0}")]
    Storage(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl SupportlineError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            SupportlineError::BadRequest(_) => ClientCode::BadRequest,
            SupportlineError::AuthFailed => ClientCode::AuthFailed,
            SupportlineError::UnknownUser(_) => ClientCode::UnknownUser,
            SupportlineError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            SupportlineError::Storage(_) => ClientCode::Storage,
            SupportlineError::Internal(_) => ClientCode::Internal,
        }
    }
}
