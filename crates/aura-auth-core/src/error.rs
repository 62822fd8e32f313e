//! Auth errors

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// OTP code absent, expired, or already consumed
    #[error("Invalid or expired code")]
    InvalidCode,

    /// Id-token failed signature/audience checks or lacks an email
    #[error("invalid identity token")]
    InvalidIdToken,

    /// Id-token is past its expiry
    #[error("identity token expired")]
    IdTokenExpired,

    /// Session credential is malformed, tampered, or expired
    #[error("invalid session")]
    InvalidSession,

    /// Transactional mail could not be sent
    #[error("failed to send verification email: {0}")]
    DeliveryFailed(String),

    /// Required secret/key absent or unusable
    #[error("auth misconfigured: {0}")]
    Misconfigured(String),

    /// Upstream identity provider call failed
    #[error("identity provider error: {0}")]
    Upstream(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCode => 400,
            Self::InvalidIdToken | Self::IdTokenExpired | Self::InvalidSession => 401,
            Self::DeliveryFailed(_)
            | Self::Misconfigured(_)
            | Self::Upstream(_)
            | Self::Database(_)
            | Self::Internal(_) => 500,
        }
    }
}

impl From<aura_db::DbError> for AuthError {
    fn from(err: aura_db::DbError) -> Self {
        tracing::error!("Database error: {}", err);
        Self::Database(err.to_string())
    }
}
