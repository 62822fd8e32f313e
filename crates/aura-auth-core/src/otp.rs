//! Email one-time code flow

use aura_db::{CreateVerificationToken, VerificationTokenRepository};
use aura_types::VerifiedIdentity;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::mailer::Mailer;
use crate::AuthError;

/// Generate a 6-digit verification code, uniform over 100000-999999.
pub fn generate_otp_code() -> String {
    let mut rng = rand::rng();
    let code: u32 = rng.random_range(100_000..=999_999);
    code.to_string()
}

/// Email OTP service: issues codes and redeems them for verified identities.
pub struct OtpService<V, M> {
    tokens: Arc<V>,
    mailer: Arc<M>,
    ttl: Duration,
}

impl<V: VerificationTokenRepository, M: Mailer> OtpService<V, M> {
    /// Create a new OTP service
    pub fn new(tokens: Arc<V>, mailer: Arc<M>, ttl: Duration) -> Self {
        Self { tokens, mailer, ttl }
    }

    /// Issue a fresh code to the given address and dispatch it by mail.
    ///
    /// Each send produces an independent code; unexpired prior codes stay
    /// valid. A mail transport failure surfaces as `DeliveryFailed`, distinct
    /// from any verification failure.
    pub async fn send_code(&self, email: &str) -> Result<(), AuthError> {
        let code = generate_otp_code();
        let expires = Utc::now()
            + chrono::Duration::from_std(self.ttl)
                .map_err(|e| AuthError::Internal(format!("invalid OTP ttl: {e}")))?;

        self.tokens
            .create(CreateVerificationToken {
                identifier: email.to_string(),
                token: code.clone(),
                expires,
            })
            .await?;

        self.mailer.send_otp(email, &code).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to send verification email");
            AuthError::DeliveryFailed(e.to_string())
        })?;

        tracing::debug!(email = %email, "Verification code issued");
        Ok(())
    }

    /// Redeem a code for a verified identity.
    ///
    /// Succeeds only if an unexpired row matches `(email, code)`. Every row
    /// matching the pair is deleted, so the same code cannot be replayed.
    pub async fn verify(&self, email: &str, code: &str) -> Result<VerifiedIdentity, AuthError> {
        let expirations = self.tokens.consume(email, code).await?;
        let now = Utc::now();

        if expirations.iter().any(|expires| *expires > now) {
            Ok(VerifiedIdentity::from_email(email))
        } else {
            Err(AuthError::InvalidCode)
        }
    }
}
