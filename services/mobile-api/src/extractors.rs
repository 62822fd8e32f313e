//! Axum extractors for authentication

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::header;

use aura_types::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Authenticated user extracted from the session credential.
///
/// Rejects with 401 when the credential is missing or invalid; use
/// `MaybeAuthUser` on endpoints where anonymous callers are fine.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = extract_token(parts).ok_or(ApiError::Unauthorized)?;

        let claims = app_state.auth.validate_session(&token).map_err(|e| {
            tracing::debug!(error = ?e, "Session validation failed");
            ApiError::Unauthorized
        })?;

        let user_id = claims.user_id().ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}

/// Optional auth extractor: anonymous callers resolve to `None` rather than
/// a rejection.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(_) => Ok(MaybeAuthUser(None)),
        }
    }
}

/// Extract the session credential from the `session` cookie or a bearer
/// Authorization header.
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = parts.headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie
                    .strip_prefix(SESSION_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
                {
                    return Some(value.to_string());
                }
            }
        }
    }

    None
}
