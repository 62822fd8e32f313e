//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use aura_types::AuthProvider;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Find a user by a provider's external id
    async fn find_by_external_id(
        &self,
        provider: AuthProvider,
        external_id: &str,
    ) -> DbResult<Option<UserRow>>;

    /// Find a user by Stripe subscription ID
    async fn find_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> DbResult<Option<UserRow>>;

    /// Create a new user.
    ///
    /// A unique violation on `email` (or an external id) surfaces as
    /// `DbError::Duplicate`; callers racing to create the same account retry
    /// as a lookup.
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Attach a provider external id to an existing user and refresh the
    /// display attributes from the provider payload.
    async fn attach_external_id(
        &self,
        id: Uuid,
        provider: AuthProvider,
        external_id: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> DbResult<UserRow>;

    /// Write onboarding fields and flip `onboarded` to true.
    ///
    /// Returns `None` when the user is already onboarded (the transition is
    /// write-once) or does not exist.
    async fn mark_onboarded(&self, id: Uuid, fields: OnboardingFields)
        -> DbResult<Option<UserRow>>;

    /// Partially update profile fields; absent fields keep their values.
    async fn update_profile(&self, id: Uuid, update: UpdateProfile)
        -> DbResult<Option<UserRow>>;

    /// Set the Stripe customer id (stable once created)
    async fn set_stripe_customer_id(&self, id: Uuid, customer_id: &str) -> DbResult<()>;

    /// Apply a subscription-state write, guarded by event recency.
    ///
    /// The patch lands only when the row's `subscription_event_at` is null or
    /// not newer than the patch's `event_at`; returns whether it was applied.
    async fn apply_subscription_patch(&self, id: Uuid, patch: SubscriptionPatch)
        -> DbResult<bool>;

    /// Delete a user
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub email: String,
    pub provider: AuthProvider,
    pub google_id: Option<String>,
    pub apple_id: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Onboarding input; applied together with the `onboarded` flag
#[derive(Debug, Clone, Default)]
pub struct OnboardingFields {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub alpha_level: Option<String>,
    pub notifications: Option<bool>,
}

/// Partial profile update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub alpha_level: Option<String>,
    pub notifications: Option<bool>,
}

/// Subscription-state write.
///
/// `status` and `event_at` are always written; the remaining fields keep
/// their current values when `None`. `event_at` is the source event's
/// timestamp (webhook `created`, or now for the poll path) and drives the
/// stale-event guard.
#[derive(Debug, Clone)]
pub struct SubscriptionPatch {
    pub stripe_subscription_id: Option<String>,
    pub plan: Option<String>,
    pub status: String,
    pub subscribed: Option<bool>,
    pub ends_at: Option<DateTime<Utc>>,
    pub event_at: DateTime<Utc>,
}

/// Verification token repository trait (email OTP)
#[async_trait]
pub trait VerificationTokenRepository: Send + Sync {
    /// Persist a freshly issued code. Prior unexpired codes are left alive.
    async fn create(&self, token: CreateVerificationToken) -> DbResult<()>;

    /// Delete every row matching `(identifier, token)` and return the
    /// `expires` timestamps of the deleted rows.
    ///
    /// The caller decides success: verification holds only if at least one
    /// deleted row was unexpired. Deleting all matches (not just one)
    /// prevents replay of the same code.
    async fn consume(&self, identifier: &str, token: &str) -> DbResult<Vec<DateTime<Utc>>>;
}

/// Create verification token input
#[derive(Debug, Clone)]
pub struct CreateVerificationToken {
    pub identifier: String,
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Conversation repository trait
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// List a user's conversations, most recently updated first
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<ConversationRow>>;

    /// Fetch a conversation only if it is owned by the given user
    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> DbResult<Option<ConversationRow>>;

    /// Messages of a conversation, ordered by creation time
    async fn messages(&self, conversation_id: Uuid) -> DbResult<Vec<MessageRow>>;

    /// Create a new conversation
    async fn create(&self, conversation: CreateConversation) -> DbResult<ConversationRow>;

    /// Append messages and bump the conversation's `updated_at`
    async fn append_messages(
        &self,
        conversation_id: Uuid,
        messages: Vec<NewMessage>,
    ) -> DbResult<()>;

    /// Rename a conversation owned by the given user
    async fn rename(
        &self,
        id: Uuid,
        user_id: Uuid,
        title: &str,
    ) -> DbResult<Option<ConversationRow>>;

    /// Delete a conversation owned by the given user (messages cascade).
    /// Returns whether a row was deleted.
    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> DbResult<bool>;
}

/// Create conversation input
#[derive(Debug, Clone)]
pub struct CreateConversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
}

/// New message input
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub role: String,
    pub content: String,
}

/// Usage repository trait
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Record one model invocation's token counts
    async fn record(&self, record: CreateUsageRecord) -> DbResult<()>;

    /// Aggregate usage per model for a user
    async fn summary_for_user(&self, user_id: Uuid) -> DbResult<Vec<ModelUsageRow>>;
}

/// Create usage record input
#[derive(Debug, Clone)]
pub struct CreateUsageRecord {
    pub user_id: Uuid,
    pub model: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
}
