//! Profile handlers

use axum::extract::State;
use axum::Json;
use aura_billing_core::SubscriptionProvider;
use aura_db::{UpdateProfile, UserRepository};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::handlers::UserBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub alpha_level: Option<String>,
    pub notifications: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// GET /user/me
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<UserBody>> {
    let user = state
        .repos
        .users
        .find_by_id(auth_user.user_id.0)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(user.into()))
}

/// PATCH /user/me
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserBody>> {
    if let Some(age) = req.age {
        if !(13..=120).contains(&age) {
            return Err(ApiError::BadRequest("Invalid age".to_string()));
        }
    }

    let update = UpdateProfile {
        name: req.name,
        age: req.age,
        gender: req.gender,
        alpha_level: req.alpha_level,
        notifications: req.notifications,
    };

    let user = state
        .repos
        .users
        .update_profile(auth_user.user_id.0, update)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(user.into()))
}

/// DELETE /user/me
///
/// Cancels any live provider subscription first, then deletes the account.
/// The deletion proceeds regardless of the cancellation outcome.
pub async fn delete_account(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<DeleteResponse>> {
    let user = state
        .repos
        .users
        .find_by_id(auth_user.user_id.0)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(subscription_id) = user.stripe_subscription_id.as_deref() {
        if let Err(e) = state.stripe.cancel_subscription(subscription_id).await {
            tracing::warn!(
                user_id = %user.id,
                subscription_id = %subscription_id,
                error = %e,
                "Subscription cancellation failed during account deletion"
            );
        }
    }

    state.repos.users.delete(user.id).await?;
    tracing::info!(user_id = %user.id, "Account deleted");

    Ok(Json(DeleteResponse { success: true }))
}
