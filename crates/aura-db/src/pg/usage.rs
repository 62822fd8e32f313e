//! PostgreSQL usage repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ModelUsageRow;
use crate::repo::{CreateUsageRecord, UsageRepository};

/// PostgreSQL usage repository
#[derive(Clone)]
pub struct PgUsageRepository {
    pool: PgPool,
}

impl PgUsageRepository {
    /// Create a new usage repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageRepository for PgUsageRepository {
    async fn record(&self, record: CreateUsageRecord) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO usage_records (id, user_id, model, input_tokens, output_tokens)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(record.user_id)
        .bind(&record.model)
        .bind(record.input_tokens)
        .bind(record.output_tokens)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn summary_for_user(&self, user_id: Uuid) -> DbResult<Vec<ModelUsageRow>> {
        let rows = sqlx::query_as::<_, ModelUsageRow>(
            "SELECT model,
                    COUNT(*) AS requests,
                    COALESCE(SUM(input_tokens), 0)::BIGINT AS input_tokens,
                    COALESCE(SUM(output_tokens), 0)::BIGINT AS output_tokens
             FROM usage_records
             WHERE user_id = $1
             GROUP BY model
             ORDER BY model",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
