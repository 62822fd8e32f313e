//! Configuration types for the auth service

use std::time::Duration;

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Google OAuth client id (id-token audience)
    pub google_client_id: String,
    /// Apple services id / bundle id (id-token audience)
    pub apple_client_id: String,
    /// HMAC secret for session token signing
    pub session_secret: String,
    /// Session validity window
    pub session_ttl: Duration,
    /// OTP code validity window
    pub otp_ttl: Duration,
    /// JWKS cache duration
    pub jwks_cache_duration: Duration,
}

impl AuthConfig {
    /// Create a new auth config with the default validity windows
    /// (30-day sessions, 10-minute OTP codes).
    pub fn new(
        google_client_id: impl Into<String>,
        apple_client_id: impl Into<String>,
        session_secret: impl Into<String>,
    ) -> Self {
        Self {
            google_client_id: google_client_id.into(),
            apple_client_id: apple_client_id.into(),
            session_secret: session_secret.into(),
            session_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            otp_ttl: Duration::from_secs(10 * 60),
            jwks_cache_duration: Duration::from_secs(60 * 60),
        }
    }

    /// Set session validity window
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set OTP validity window
    pub fn with_otp_ttl(mut self, ttl: Duration) -> Self {
        self.otp_ttl = ttl;
        self
    }

    /// Set JWKS cache duration
    pub fn with_jwks_cache_duration(mut self, duration: Duration) -> Self {
        self.jwks_cache_duration = duration;
        self
    }
}
