//! Conversation storage handlers

use axum::extract::{Path, State};
use axum::Json;
use aura_db::{ConversationRepository, ConversationRow, CreateConversation, MessageRow, NewMessage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 200;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MessageInput {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<MessageInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConversationRequest {
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<MessageInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    pub title: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationBody {
    pub id: String,
    pub title: Option<String>,
    pub messages: Vec<MessageBody>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

impl From<ConversationRow> for ConversationSummary {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: row.id.to_string(),
            title: row.title,
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
        }
    }
}

impl From<MessageRow> for MessageBody {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id.to_string(),
            role: row.role,
            content: row.content,
            created_at: row.created_at.to_rfc3339(),
        }
    }
}

fn conversation_body(row: ConversationRow, messages: Vec<MessageRow>) -> ConversationBody {
    ConversationBody {
        id: row.id.to_string(),
        title: row.title,
        messages: messages.into_iter().map(MessageBody::from).collect(),
        created_at: row.created_at.to_rfc3339(),
        updated_at: row.updated_at.to_rfc3339(),
    }
}

fn validate_messages(messages: &[MessageInput]) -> Result<(), ApiError> {
    for message in messages {
        if !matches!(message.role.as_str(), "user" | "assistant" | "system") {
            return Err(ApiError::BadRequest(format!(
                "Invalid message role: {}",
                message.role
            )));
        }
        if message.content.is_empty() {
            return Err(ApiError::BadRequest(
                "Message content cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_title(title: &Option<String>) -> Result<(), ApiError> {
    if let Some(title) = title {
        if title.len() > MAX_TITLE_LEN {
            return Err(ApiError::BadRequest("Title too long".to_string()));
        }
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    let rows = state
        .repos
        .conversations
        .list_for_user(auth_user.user_id.0)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// POST /conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateConversationRequest>,
) -> ApiResult<Json<ConversationBody>> {
    validate_title(&req.title)?;
    validate_messages(&req.messages)?;

    let row = state
        .repos
        .conversations
        .create(CreateConversation {
            id: Uuid::new_v4(),
            user_id: auth_user.user_id.0,
            title: req.title,
        })
        .await?;

    if !req.messages.is_empty() {
        state
            .repos
            .conversations
            .append_messages(
                row.id,
                req.messages
                    .into_iter()
                    .map(|m| NewMessage {
                        role: m.role,
                        content: m.content,
                    })
                    .collect(),
            )
            .await?;
    }

    let messages = state.repos.conversations.messages(row.id).await?;
    Ok(Json(conversation_body(row, messages)))
}

/// GET /conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ConversationBody>> {
    // Absent and not-owned are indistinguishable to the caller
    let row = state
        .repos
        .conversations
        .find_for_user(id, auth_user.user_id.0)
        .await?
        .ok_or(ApiError::NotFound)?;

    let messages = state.repos.conversations.messages(row.id).await?;
    Ok(Json(conversation_body(row, messages)))
}

/// POST /conversations/{id}
///
/// Rename and/or append messages
pub async fn update_conversation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateConversationRequest>,
) -> ApiResult<Json<ConversationBody>> {
    validate_title(&req.title)?;
    validate_messages(&req.messages)?;

    let mut row = state
        .repos
        .conversations
        .find_for_user(id, auth_user.user_id.0)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(title) = req.title {
        row = state
            .repos
            .conversations
            .rename(id, auth_user.user_id.0, &title)
            .await?
            .ok_or(ApiError::NotFound)?;
    }

    if !req.messages.is_empty() {
        state
            .repos
            .conversations
            .append_messages(
                id,
                req.messages
                    .into_iter()
                    .map(|m| NewMessage {
                        role: m.role,
                        content: m.content,
                    })
                    .collect(),
            )
            .await?;
    }

    let messages = state.repos.conversations.messages(id).await?;
    Ok(Json(conversation_body(row, messages)))
}

/// DELETE /conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state
        .repos
        .conversations
        .delete_for_user(id, auth_user.user_id.0)
        .await?;

    if !deleted {
        return Err(ApiError::NotFound);
    }

    Ok(Json(DeleteResponse { success: true }))
}
