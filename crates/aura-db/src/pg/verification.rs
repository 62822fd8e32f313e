//! PostgreSQL verification token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::DbResult;
use crate::repo::{CreateVerificationToken, VerificationTokenRepository};

/// PostgreSQL verification token repository
#[derive(Clone)]
pub struct PgVerificationTokenRepository {
    pool: PgPool,
}

impl PgVerificationTokenRepository {
    /// Create a new verification token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationTokenRepository for PgVerificationTokenRepository {
    async fn create(&self, token: CreateVerificationToken) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO verification_tokens (identifier, token, expires) VALUES ($1, $2, $3)",
        )
        .bind(&token.identifier)
        .bind(&token.token)
        .bind(token.expires)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume(&self, identifier: &str, token: &str) -> DbResult<Vec<DateTime<Utc>>> {
        // Every row matching the pair goes, expired duplicates included; the
        // caller checks the returned expirations for a live one.
        let expirations = sqlx::query_scalar::<_, DateTime<Utc>>(
            "DELETE FROM verification_tokens
             WHERE identifier = $1 AND token = $2
             RETURNING expires",
        )
        .bind(identifier)
        .bind(token)
        .fetch_all(&self.pool)
        .await?;

        Ok(expirations)
    }
}
