//! PostgreSQL conversation repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{ConversationRow, MessageRow};
use crate::repo::{ConversationRepository, CreateConversation, NewMessage};

/// PostgreSQL conversation repository
#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    /// Create a new conversation repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<ConversationRow>> {
        let rows = sqlx::query_as::<_, ConversationRow>(
            "SELECT id, user_id, title, created_at, updated_at
             FROM conversations
             WHERE user_id = $1
             ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> DbResult<Option<ConversationRow>> {
        let row = sqlx::query_as::<_, ConversationRow>(
            "SELECT id, user_id, title, created_at, updated_at
             FROM conversations
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn messages(&self, conversation_id: Uuid) -> DbResult<Vec<MessageRow>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, conversation_id, role, content, created_at
             FROM messages
             WHERE conversation_id = $1
             ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create(&self, conversation: CreateConversation) -> DbResult<ConversationRow> {
        let row = sqlx::query_as::<_, ConversationRow>(
            "INSERT INTO conversations (id, user_id, title)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, title, created_at, updated_at",
        )
        .bind(conversation.id)
        .bind(conversation.user_id)
        .bind(&conversation.title)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn append_messages(
        &self,
        conversation_id: Uuid,
        messages: Vec<NewMessage>,
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        for message in &messages {
            sqlx::query(
                "INSERT INTO messages (id, conversation_id, role, content)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(conversation_id)
            .bind(&message.role)
            .bind(&message.content)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE conversations SET updated_at = NOW() WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn rename(
        &self,
        id: Uuid,
        user_id: Uuid,
        title: &str,
    ) -> DbResult<Option<ConversationRow>> {
        let row = sqlx::query_as::<_, ConversationRow>(
            "UPDATE conversations SET title = $3, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING id, user_id, title, created_at, updated_at",
        )
        .bind(id)
        .bind(user_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
