//! Usage stats handler

use axum::extract::State;
use axum::Json;
use aura_db::UsageRepository;
use serde::Serialize;

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub total_requests: i64,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub by_model: Vec<ModelUsage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    pub model: String,
    pub requests: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
}

/// GET /usage
///
/// Aggregate token/model usage for the current user
pub async fn get_usage(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<UsageResponse>> {
    let rows = state.repos.usage.summary_for_user(auth_user.user_id.0).await?;

    let total_requests = rows.iter().map(|r| r.requests).sum();
    let total_input_tokens = rows.iter().map(|r| r.input_tokens).sum();
    let total_output_tokens = rows.iter().map(|r| r.output_tokens).sum();

    Ok(Json(UsageResponse {
        total_requests,
        total_input_tokens,
        total_output_tokens,
        by_model: rows
            .into_iter()
            .map(|r| ModelUsage {
                model: r.model,
                requests: r.requests,
                input_tokens: r.input_tokens,
                output_tokens: r.output_tokens,
            })
            .collect(),
    }))
}
