//! Application state
//!
//! Every external client is constructed once at startup and injected here;
//! handlers never reach for module-scope globals.

use std::sync::Arc;

use aura_auth_core::{AuthService, GoogleOauthClient, SmtpMailer};
use aura_billing_core::{StripeClient, SubscriptionReconciler, WebhookHandler};
use aura_db::pg::{PgUserRepository, PgVerificationTokenRepository, Repositories};
use aura_db::DbPool;

use crate::config::Config;

/// Type alias for the auth service with concrete repository types
pub type AuthServiceImpl =
    AuthService<PgUserRepository, PgVerificationTokenRepository, SmtpMailer>;

/// Type alias for the reconciler with concrete types
pub type ReconcilerImpl = SubscriptionReconciler<PgUserRepository, StripeClient>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth service: OTP, OAuth verification, sessions, account resolution
    pub auth: Arc<AuthServiceImpl>,
    /// Google authorization-code client (web redirect flow)
    pub google_oauth: Arc<GoogleOauthClient>,
    /// Stripe client
    pub stripe: Arc<StripeClient>,
    /// Stripe webhook verification/parsing
    pub webhooks: WebhookHandler,
    /// Subscription reconciler (webhook + poll paths)
    pub reconciler: Arc<ReconcilerImpl>,
    /// Database repositories
    pub repos: Repositories,
    /// Database connection pool
    pub pool: DbPool,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        auth: AuthServiceImpl,
        google_oauth: GoogleOauthClient,
        stripe: StripeClient,
        reconciler: ReconcilerImpl,
        repos: Repositories,
        pool: DbPool,
        config: Config,
    ) -> Self {
        let webhooks = WebhookHandler::new(config.billing.stripe_webhook_secret.clone());
        Self {
            auth: Arc::new(auth),
            google_oauth: Arc::new(google_oauth),
            stripe: Arc::new(stripe),
            webhooks,
            reconciler: Arc::new(reconciler),
            repos,
            pool,
            config: Arc::new(config),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
