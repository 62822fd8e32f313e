//! Stripe subscription handlers

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use aura_billing_core::{BillingError, SubscriptionProvider};
use aura_db::UserRepository;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::handlers::UserBody;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub plan: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /stripe/create-checkout
///
/// Start a subscription purchase. Creates the billing customer on first use.
pub async fn create_checkout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateCheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let start = Instant::now();

    let user = state
        .repos
        .users
        .find_by_id(auth_user.user_id.0)
        .await?
        .ok_or(ApiError::NotFound)?;

    let customer_id = match user.stripe_customer_id {
        Some(id) => id,
        None => {
            let id = state
                .stripe
                .create_customer(&user.email, &user.id.to_string())
                .await?;
            state.repos.users.set_stripe_customer_id(user.id, &id).await?;
            id
        }
    };

    let session = state
        .stripe
        .create_checkout_session(&customer_id, &user.id.to_string(), &req.plan)
        .await?;

    metrics::counter!("billing_checkouts_created_total").increment(1);
    metrics::histogram!("billing_operation_duration_seconds", "operation" => "create_checkout")
        .record(start.elapsed().as_secs_f64());

    tracing::info!(user_id = %user.id, plan = %req.plan, "Checkout session created");

    Ok(Json(CheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}

/// POST /stripe/create-portal-session
pub async fn create_portal_session(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<PortalResponse>> {
    let user = state
        .repos
        .users
        .find_by_id(auth_user.user_id.0)
        .await?
        .ok_or(ApiError::NotFound)?;

    let customer_id = user
        .stripe_customer_id
        .ok_or_else(|| ApiError::BadRequest("No billing account".to_string()))?;

    let url = state.stripe.create_portal_session(&customer_id).await?;

    Ok(Json(PortalResponse { url }))
}

/// POST /stripe/sync-subscription
///
/// Poll path: overwrite local subscription state from the provider
pub async fn sync_subscription(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<UserBody>> {
    let user = state
        .repos
        .users
        .find_by_id(auth_user.user_id.0)
        .await?
        .ok_or(ApiError::NotFound)?;

    let synced = state.reconciler.sync(&user).await?;

    Ok(Json(synced.into()))
}

/// POST /stripe/webhook
///
/// Handle Stripe webhook events with signature verification.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let start = Instant::now();

    let Some(sig_header) = headers.get("stripe-signature") else {
        tracing::warn!("Missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    let Ok(signature) = sig_header.to_str() else {
        tracing::warn!("Invalid Stripe-Signature header encoding");
        return StatusCode::BAD_REQUEST;
    };

    // Signature failure is request-fatal; the provider's retry covers
    // transient delivery issues.
    let event = match state.webhooks.verify_and_parse(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = ?e, "Webhook verification failed");
            metrics::counter!("billing_webhooks_processed_total", "status" => "rejected")
                .increment(1);
            return StatusCode::BAD_REQUEST;
        }
    };

    match state.reconciler.process_event(event).await {
        Ok(()) => {
            metrics::counter!("billing_webhooks_processed_total", "status" => "success")
                .increment(1);
            metrics::histogram!(
                "billing_operation_duration_seconds",
                "operation" => "process_webhook"
            )
            .record(start.elapsed().as_secs_f64());

            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(error = ?e, "Webhook processing failed");
            metrics::counter!("billing_webhooks_processed_total", "status" => "error").increment(1);

            match e {
                BillingError::Webhook(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }
}
