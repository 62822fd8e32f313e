//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// User has no subscription to act on
    #[error("no active subscription")]
    NoSubscription,

    /// Unknown plan name (no configured price)
    #[error("unknown plan: {0}")]
    UnknownPlan(String),

    /// Payment provider error
    #[error("provider error: {0}")]
    Provider(String),

    /// Webhook verification or processing error
    #[error("webhook error: {0}")]
    Webhook(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UserNotFound => 404,
            Self::NoSubscription | Self::UnknownPlan(_) | Self::Webhook(_) => 400,
            Self::Provider(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<aura_db::DbError> for BillingError {
    fn from(err: aura_db::DbError) -> Self {
        tracing::error!("Database error: {}", err);
        Self::Database(err.to_string())
    }
}
