//! PostgreSQL user repository implementation

use async_trait::async_trait;
use aura_types::AuthProvider;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::UserRow;
use crate::repo::{CreateUser, OnboardingFields, SubscriptionPatch, UpdateProfile, UserRepository};

const USER_COLUMNS: &str = "id, email, google_id, apple_id, provider, name, picture, onboarded, \
     age, gender, alpha_level, notifications, stripe_customer_id, stripe_subscription_id, \
     subscribed, subscription_plan, subscription_status, subscription_ends_at, \
     subscription_event_at, created_at";

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_external_id(
        &self,
        provider: AuthProvider,
        external_id: &str,
    ) -> DbResult<Option<UserRow>> {
        let column = match provider {
            AuthProvider::Google => "google_id",
            AuthProvider::Apple => "apple_id",
            // The OTP flow carries no external id; nothing can match.
            AuthProvider::Email => return Ok(None),
        };

        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE stripe_subscription_id = $1"
        ))
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, email, provider, google_id, apple_id, name, picture)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(user.provider.as_str())
        .bind(&user.google_id)
        .bind(&user.apple_id)
        .bind(&user.name)
        .bind(&user.picture)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn attach_external_id(
        &self,
        id: Uuid,
        provider: AuthProvider,
        external_id: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> DbResult<UserRow> {
        let column = match provider {
            AuthProvider::Google => "google_id",
            AuthProvider::Apple => "apple_id",
            // The OTP flow carries no external id; refresh display
            // attributes only.
            AuthProvider::Email => {
                let row = sqlx::query_as::<_, UserRow>(&format!(
                    "UPDATE users SET
                         name = COALESCE($2, name), picture = COALESCE($3, picture)
                     WHERE id = $1 RETURNING {USER_COLUMNS}"
                ))
                .bind(id)
                .bind(name)
                .bind(picture)
                .fetch_one(&self.pool)
                .await?;
                return Ok(row);
            }
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET {column} = $2,
                 name = COALESCE($3, name), picture = COALESCE($4, picture)
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(external_id)
        .bind(name)
        .bind(picture)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn mark_onboarded(
        &self,
        id: Uuid,
        fields: OnboardingFields,
    ) -> DbResult<Option<UserRow>> {
        // onboarded is write-once; an already-onboarded row matches nothing.
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET
                 onboarded = TRUE,
                 name = COALESCE($2, name),
                 age = COALESCE($3, age),
                 gender = COALESCE($4, gender),
                 alpha_level = COALESCE($5, alpha_level),
                 notifications = COALESCE($6, notifications)
             WHERE id = $1 AND onboarded = FALSE
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(fields.age)
        .bind(&fields.gender)
        .bind(&fields.alpha_level)
        .bind(fields.notifications)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_profile(&self, id: Uuid, update: UpdateProfile) -> DbResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET
                 name = COALESCE($2, name),
                 age = COALESCE($3, age),
                 gender = COALESCE($4, gender),
                 alpha_level = COALESCE($5, alpha_level),
                 notifications = COALESCE($6, notifications)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.name)
        .bind(update.age)
        .bind(&update.gender)
        .bind(&update.alpha_level)
        .bind(update.notifications)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_stripe_customer_id(&self, id: Uuid, customer_id: &str) -> DbResult<()> {
        sqlx::query("UPDATE users SET stripe_customer_id = $1 WHERE id = $2")
            .bind(customer_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn apply_subscription_patch(
        &self,
        id: Uuid,
        patch: SubscriptionPatch,
    ) -> DbResult<bool> {
        // The recency guard: a patch older than the last applied event is a
        // no-op, which the caller observes via the affected-row count.
        let result = sqlx::query(
            "UPDATE users SET
                 stripe_subscription_id = COALESCE($2, stripe_subscription_id),
                 subscription_plan = COALESCE($3, subscription_plan),
                 subscription_status = $4,
                 subscribed = COALESCE($5, subscribed),
                 subscription_ends_at = COALESCE($6, subscription_ends_at),
                 subscription_event_at = $7
             WHERE id = $1
               AND (subscription_event_at IS NULL OR subscription_event_at <= $7)",
        )
        .bind(id)
        .bind(&patch.stripe_subscription_id)
        .bind(&patch.plan)
        .bind(&patch.status)
        .bind(patch.subscribed)
        .bind(patch.ends_at)
        .bind(patch.event_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
