//! Aura Mobile API
//!
//! Backend-for-frontend for the Aura mobile app: authentication, profile,
//! conversation storage, subscriptions, and usage stats.

mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use aura_auth_core::{AuthService, GoogleOauthClient, SmtpMailer};
use aura_billing_core::{StripeClient, SubscriptionReconciler};
use aura_db::pg::Repositories;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Aura Mobile API");

    let config = Config::from_env()?;

    // Database
    let pool = aura_db::create_pool(&config.database_url).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    let repos = Repositories::new(pool.clone());

    // Injected clients: one instance each, process-wide lifetime
    let mailer = SmtpMailer::new(
        &config.smtp.host,
        config.smtp.port,
        config.smtp.username.clone(),
        config.smtp.password.clone(),
        config.smtp.use_tls,
        &config.smtp.from_address,
    )
    .map_err(|e| anyhow::anyhow!("mail transport: {e}"))?;

    let users = Arc::new(repos.users.clone());
    let auth = AuthService::new(
        config.auth.clone(),
        Arc::clone(&users),
        Arc::new(repos.verification_tokens.clone()),
        Arc::new(mailer),
    )
    .map_err(|e| anyhow::anyhow!("auth service: {e}"))?;

    let google_oauth = GoogleOauthClient::new(
        config.auth.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.google_redirect_uri.clone(),
    );

    let stripe = StripeClient::new(config.billing.clone());
    let reconciler = SubscriptionReconciler::new(users, Arc::new(stripe.clone()));

    let state = AppState::new(auth, google_oauth, stripe, reconciler, repos, pool, config);
    let http_port = state.config.http_port;

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Auth
        .route("/auth/email/send", post(handlers::auth::send_email_code))
        .route("/auth/email/verify", post(handlers::auth::verify_email_code))
        .route("/auth/google/initiate", get(handlers::auth::google_initiate))
        .route("/auth/google/callback", get(handlers::auth::google_callback))
        .route("/auth/google/native", post(handlers::auth::google_native))
        .route("/auth/apple/initiate", get(handlers::auth::apple_initiate))
        .route("/auth/apple/native", post(handlers::auth::apple_native))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/onboard", post(handlers::auth::onboard))
        // Profile
        .route(
            "/user/me",
            get(handlers::user::get_profile)
                .patch(handlers::user::update_profile)
                .delete(handlers::user::delete_account),
        )
        // Conversations
        .route(
            "/conversations",
            get(handlers::conversations::list_conversations)
                .post(handlers::conversations::create_conversation),
        )
        .route(
            "/conversations/{id}",
            get(handlers::conversations::get_conversation)
                .post(handlers::conversations::update_conversation)
                .delete(handlers::conversations::delete_conversation),
        )
        // Billing
        .route("/stripe/create-checkout", post(handlers::billing::create_checkout))
        .route(
            "/stripe/create-portal-session",
            post(handlers::billing::create_portal_session),
        )
        .route("/stripe/sync-subscription", post(handlers::billing::sync_subscription))
        .route("/stripe/webhook", post(handlers::billing::stripe_webhook))
        // Usage
        .route("/usage", get(handlers::usage::get_usage))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
