//! Configuration for the mobile API service.

use aura_auth_core::AuthConfig;
use aura_billing_core::BillingConfig;
use std::time::Duration;

/// SMTP transport settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub from_address: String,
}

/// Mobile API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// Billing core configuration
    pub billing: BillingConfig,

    /// SMTP settings for OTP mail
    pub smtp: SmtpConfig,

    /// Google OAuth client secret (authorization-code flow)
    pub google_client_secret: String,

    /// Redirect URI registered with Google for the callback route
    pub google_redirect_uri: String,

    /// Redirect URI registered with Apple
    pub apple_redirect_uri: String,

    /// App deep link the OAuth callback hands the session to
    pub app_redirect_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Session secret (minimum 32 bytes; the issuer re-checks)
        let session_secret =
            std::env::var("SESSION_SECRET").map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "SESSION_SECRET must be at least 32 characters",
            ));
        }

        // OAuth clients
        let google_client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?;
        let google_client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?;
        let google_redirect_uri = std::env::var("GOOGLE_REDIRECT_URI")
            .map_err(|_| ConfigError::Missing("GOOGLE_REDIRECT_URI"))?;
        let apple_client_id = std::env::var("APPLE_CLIENT_ID")
            .map_err(|_| ConfigError::Missing("APPLE_CLIENT_ID"))?;
        let apple_redirect_uri = std::env::var("APPLE_REDIRECT_URI")
            .map_err(|_| ConfigError::Missing("APPLE_REDIRECT_URI"))?;
        let app_redirect_url = std::env::var("APP_REDIRECT_URL")
            .map_err(|_| ConfigError::Missing("APP_REDIRECT_URL"))?;

        // Session duration (default 30 days)
        let session_ttl_days: u64 = std::env::var("SESSION_TTL_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SESSION_TTL_DAYS"))?;

        let auth = AuthConfig::new(google_client_id, apple_client_id, session_secret)
            .with_session_ttl(Duration::from_secs(session_ttl_days * 24 * 3600));

        // Stripe
        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?;
        let stripe_webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;

        let mut billing = BillingConfig::new(stripe_secret_key, stripe_webhook_secret);
        if let Ok(price) = std::env::var("STRIPE_MONTHLY_PRICE_ID") {
            billing = billing.with_price("monthly", price);
        }
        if let Ok(price) = std::env::var("STRIPE_YEARLY_PRICE_ID") {
            billing = billing.with_price("yearly", price);
        }
        let success_url = std::env::var("STRIPE_SUCCESS_URL")
            .unwrap_or_else(|_| format!("{app_redirect_url}?checkout=success"));
        let cancel_url = std::env::var("STRIPE_CANCEL_URL")
            .unwrap_or_else(|_| format!("{app_redirect_url}?checkout=cancel"));
        let portal_return_url =
            std::env::var("STRIPE_PORTAL_RETURN_URL").unwrap_or_else(|_| app_redirect_url.clone());
        let billing = billing.with_urls(success_url, cancel_url, portal_return_url);

        // Mail transport
        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").map_err(|_| ConfigError::Missing("SMTP_HOST"))?,
            port: std::env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("SMTP_PORT"))?,
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            use_tls: std::env::var("SMTP_TLS")
                .map(|v| v != "false")
                .unwrap_or(true),
            from_address: std::env::var("MAIL_FROM").map_err(|_| ConfigError::Missing("MAIL_FROM"))?,
        };

        Ok(Self {
            http_port,
            database_url,
            auth,
            billing,
            smtp,
            google_client_secret,
            google_redirect_uri,
            apple_redirect_uri,
            app_redirect_url,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
