//! Auth service - ties together credential verification, account resolution,
//! and session issuance

use aura_db::{UserRepository, UserRow, VerificationTokenRepository};
use aura_types::AuthProvider;
use std::sync::Arc;

use crate::{
    config::AuthConfig,
    mailer::Mailer,
    oauth::{IdTokenVerifier, OidcProvider},
    otp::OtpService,
    resolver::AccountResolver,
    session::{SessionClaims, SessionIssuer},
    AuthError,
};

/// A freshly authenticated user together with their session token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The resolved user record
    pub user: UserRow,
    /// Signed session token
    pub token: String,
}

/// Authentication service
///
/// Provides a unified interface for:
/// - Email OTP issue/redeem
/// - Google and Apple id-token verification
/// - Account resolution (find-or-create-or-link)
/// - Session issuance and validation
pub struct AuthService<U: UserRepository, V: VerificationTokenRepository, M: Mailer> {
    otp: OtpService<V, M>,
    resolver: AccountResolver<U>,
    sessions: SessionIssuer,
    google: IdTokenVerifier,
    apple: IdTokenVerifier,
    users: Arc<U>,
}

impl<U: UserRepository, V: VerificationTokenRepository, M: Mailer> AuthService<U, V, M> {
    /// Create a new auth service.
    ///
    /// Fails with `Misconfigured` when the session secret is unusable.
    pub fn new(
        config: AuthConfig,
        users: Arc<U>,
        tokens: Arc<V>,
        mailer: Arc<M>,
    ) -> Result<Self, AuthError> {
        let sessions = SessionIssuer::new(&config.session_secret, config.session_ttl)?;

        Ok(Self {
            otp: OtpService::new(tokens, mailer, config.otp_ttl),
            resolver: AccountResolver::new(Arc::clone(&users)),
            sessions,
            google: IdTokenVerifier::new(
                OidcProvider::google(config.google_client_id.clone()),
                config.jwks_cache_duration,
            ),
            apple: IdTokenVerifier::new(
                OidcProvider::apple(config.apple_client_id.clone()),
                config.jwks_cache_duration,
            ),
            users,
        })
    }

    // =========================================================================
    // Email OTP
    // =========================================================================

    /// Issue a one-time code to the given address
    pub async fn send_otp(&self, email: &str) -> Result<(), AuthError> {
        self.otp.send_code(email).await
    }

    /// Redeem a one-time code, resolve the account, and mint a session
    pub async fn login_with_otp(
        &self,
        email: &str,
        code: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let identity = self.otp.verify(email, code).await?;
        self.establish(identity).await
    }

    // =========================================================================
    // OAuth id-tokens
    // =========================================================================

    /// Verify a provider id-token, resolve the account, and mint a session
    pub async fn login_with_id_token(
        &self,
        provider: AuthProvider,
        id_token: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let verifier = match provider {
            AuthProvider::Google => &self.google,
            AuthProvider::Apple => &self.apple,
            AuthProvider::Email => return Err(AuthError::InvalidIdToken),
        };

        let identity = verifier.verify(id_token).await?;
        self.establish(identity).await
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Validate a session token and recover its claims
    pub fn validate_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.sessions.validate(token)
    }

    /// Fetch the user a session token belongs to.
    ///
    /// Returns `Ok(None)` when the token is valid but the user has since
    /// been deleted.
    pub async fn current_user(&self, token: &str) -> Result<Option<UserRow>, AuthError> {
        let claims = self.sessions.validate(token)?;
        let user_id = claims.user_id().ok_or(AuthError::InvalidSession)?;
        Ok(self.users.find_by_id(user_id.0).await?)
    }

    async fn establish(
        &self,
        identity: aura_types::VerifiedIdentity,
    ) -> Result<AuthenticatedUser, AuthError> {
        let user = self.resolver.resolve(&identity).await?;
        let token = self.sessions.issue(user.user_id(), &user.email)?;
        Ok(AuthenticatedUser { user, token })
    }
}

impl<U: UserRepository, V: VerificationTokenRepository, M: Mailer> std::fmt::Debug
    for AuthService<U, V, M>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}
