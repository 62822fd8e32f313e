//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub google_id: Option<String>,
    pub apple_id: Option<String>,
    pub provider: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub onboarded: bool,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub alpha_level: Option<String>,
    pub notifications: Option<bool>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscribed: bool,
    pub subscription_plan: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub subscription_event_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> aura_types::UserId {
        aura_types::UserId(self.id)
    }

    /// External id attached for the given provider, if any
    pub fn external_id(&self, provider: aura_types::AuthProvider) -> Option<&str> {
        match provider {
            aura_types::AuthProvider::Google => self.google_id.as_deref(),
            aura_types::AuthProvider::Apple => self.apple_id.as_deref(),
            aura_types::AuthProvider::Email => None,
        }
    }
}

/// One-time verification token row (email OTP flow)
#[derive(Debug, Clone, FromRow)]
pub struct VerificationTokenRow {
    pub identifier: String,
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Conversation row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ConversationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationRow {
    /// Convert to domain ConversationId
    pub fn conversation_id(&self) -> aura_types::ConversationId {
        aura_types::ConversationId(self.id)
    }
}

/// Message row from the database
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Usage record row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UsageRecordRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub model: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub created_at: DateTime<Utc>,
}

/// Per-model usage aggregate
#[derive(Debug, Clone, FromRow)]
pub struct ModelUsageRow {
    pub model: String,
    pub requests: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
}
