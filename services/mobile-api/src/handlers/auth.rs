//! Authentication handlers (email OTP, OAuth, me, onboarding)

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use aura_db::{OnboardingFields, UserRepository};
use aura_types::AuthProvider;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthUser, MaybeAuthUser, SESSION_COOKIE};
use crate::handlers::UserBody;
use crate::state::AppState;

const OAUTH_STATE_COOKIE: &str = "oauth_state";
const MAX_EMAIL_LEN: usize = 254;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTokenRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserBody,
}

#[derive(Debug, Deserialize)]
pub struct OauthCallbackQuery {
    pub code: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<UserBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub alpha_level: Option<String>,
    pub notifications: Option<bool>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Minimal shape check; the OTP round-trip is the real proof of ownership.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err("Email is required");
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err("Email too long");
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email address");
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err("Invalid email address");
    }
    Ok(())
}

fn session_cookie(token: &str, max_age_secs: u64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={max_age_secs}"
    )
}

fn oauth_state_cookie(state: &str) -> String {
    format!("{OAUTH_STATE_COOKIE}={state}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=600")
}

fn random_state() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_str = headers.get(header::COOKIE)?.to_str().ok()?;
    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
        {
            return Some(value.to_string());
        }
    }
    None
}

fn session_response(
    state: &AppState,
    authed: aura_auth_core::AuthenticatedUser,
) -> impl IntoResponse {
    let max_age = state.config.auth.session_ttl.as_secs();
    let cookie = session_cookie(&authed.token, max_age);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            token: authed.token,
            user: authed.user.into(),
        }),
    )
}

// ============================================================================
// Email OTP
// ============================================================================

/// POST /auth/email/send
///
/// Issue a one-time code to the given address
pub async fn send_email_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> ApiResult<Json<SendCodeResponse>> {
    validate_email(&req.email).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state.auth.send_otp(&req.email).await?;

    Ok(Json(SendCodeResponse { success: true }))
}

/// POST /auth/email/verify
///
/// Redeem a one-time code and establish a session
pub async fn verify_email_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_email(&req.email).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if req.code.len() != 6 || !req.code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::BadRequest("Invalid or expired code".to_string()));
    }

    let authed = state.auth.login_with_otp(&req.email, &req.code).await?;

    tracing::info!(user_id = %authed.user.id, "Email sign-in");
    Ok(session_response(&state, authed))
}

// ============================================================================
// Google OAuth
// ============================================================================

/// GET /auth/google/initiate
///
/// Redirect the client to the Google consent screen
pub async fn google_initiate(State(state): State<AppState>) -> impl IntoResponse {
    let oauth_state = random_state();
    let url = state.google_oauth.authorize_url(&oauth_state);

    (
        [(header::SET_COOKIE, oauth_state_cookie(&oauth_state))],
        Redirect::to(&url),
    )
}

/// GET /auth/google/callback
///
/// Exchange the authorization code, establish a session, and bounce back
/// into the app
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OauthCallbackQuery>,
) -> ApiResult<impl IntoResponse> {
    let expected_state = cookie_value(&headers, OAUTH_STATE_COOKIE)
        .ok_or_else(|| ApiError::BadRequest("Missing OAuth state".to_string()))?;
    if query.state != expected_state {
        return Err(ApiError::BadRequest("OAuth state mismatch".to_string()));
    }

    let id_token = state.google_oauth.exchange_code(&query.code).await?;
    let authed = state
        .auth
        .login_with_id_token(AuthProvider::Google, &id_token)
        .await?;

    tracing::info!(user_id = %authed.user.id, "Google sign-in (web)");

    let max_age = state.config.auth.session_ttl.as_secs();
    let cookie = session_cookie(&authed.token, max_age);
    let target = format!("{}?token={}", state.config.app_redirect_url, authed.token);

    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&target)))
}

/// POST /auth/google/native
///
/// Verify an id-token obtained by the native Google Sign-In SDK
pub async fn google_native(
    State(state): State<AppState>,
    Json(req): Json<NativeTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let authed = state
        .auth
        .login_with_id_token(AuthProvider::Google, &req.id_token)
        .await?;

    tracing::info!(user_id = %authed.user.id, "Google sign-in (native)");
    Ok(session_response(&state, authed))
}

// ============================================================================
// Apple OAuth
// ============================================================================

/// GET /auth/apple/initiate
///
/// Redirect the client to the Apple consent screen
pub async fn apple_initiate(State(state): State<AppState>) -> impl IntoResponse {
    let oauth_state = random_state();
    let url = aura_auth_core::oauth::apple_authorize_url(
        &state.config.auth.apple_client_id,
        &state.config.apple_redirect_uri,
        &oauth_state,
    );

    (
        [(header::SET_COOKIE, oauth_state_cookie(&oauth_state))],
        Redirect::to(&url),
    )
}

/// POST /auth/apple/native
///
/// Verify an id-token obtained by Sign in with Apple on device
pub async fn apple_native(
    State(state): State<AppState>,
    Json(req): Json<NativeTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let authed = state
        .auth
        .login_with_id_token(AuthProvider::Apple, &req.id_token)
        .await?;

    tracing::info!(user_id = %authed.user.id, "Apple sign-in (native)");
    Ok(session_response(&state, authed))
}

// ============================================================================
// Session
// ============================================================================

/// GET /auth/me
///
/// The current session's user, or null for anonymous callers
pub async fn me(
    State(state): State<AppState>,
    MaybeAuthUser(auth_user): MaybeAuthUser,
) -> ApiResult<Json<MeResponse>> {
    let Some(auth_user) = auth_user else {
        return Ok(Json(MeResponse { user: None }));
    };

    let user = state.repos.users.find_by_id(auth_user.user_id.0).await?;
    Ok(Json(MeResponse {
        user: user.map(UserBody::from),
    }))
}

/// POST /auth/onboard
///
/// Write onboarding fields and mark the account onboarded (write-once)
pub async fn onboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<OnboardRequest>,
) -> ApiResult<Json<UserBody>> {
    if let Some(age) = req.age {
        if !(13..=120).contains(&age) {
            return Err(ApiError::BadRequest("Invalid age".to_string()));
        }
    }

    let fields = OnboardingFields {
        name: req.name,
        age: req.age,
        gender: req.gender,
        alpha_level: req.alpha_level,
        notifications: req.notifications,
    };

    match state
        .repos
        .users
        .mark_onboarded(auth_user.user_id.0, fields)
        .await?
    {
        Some(user) => {
            tracing::info!(user_id = %user.id, "Onboarding completed");
            Ok(Json(user.into()))
        }
        None => {
            // Either gone or already onboarded; tell them apart for the 4xx
            match state.repos.users.find_by_id(auth_user.user_id.0).await? {
                Some(_) => Err(ApiError::BadRequest("Already onboarded".to_string())),
                None => Err(ApiError::NotFound),
            }
        }
    }
}
