//! Account resolution: verified identity tuple -> user record
//!
//! Find-or-create-or-link with a fixed precedence:
//! 1. A user already carrying the tuple's external id wins (no refresh).
//! 2. A user matching by email gets the external id attached in place.
//! 3. Otherwise a fresh account is created.
//!
//! Creation races resolve through the unique constraint on email: a
//! duplicate-key failure is retried as lookup-and-link, so two concurrent
//! first logins for the same address converge on one account.

use aura_db::{CreateUser, DbError, UserRepository, UserRow};
use aura_types::{AuthProvider, VerifiedIdentity};
use std::sync::Arc;
use uuid::Uuid;

use crate::AuthError;

/// Account resolver
pub struct AccountResolver<U> {
    users: Arc<U>,
}

impl<U: UserRepository> AccountResolver<U> {
    /// Create a new account resolver
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    /// Resolve a verified identity to its user record, creating or linking
    /// as needed. Idempotent: re-resolving the same tuple yields the same
    /// account.
    pub async fn resolve(&self, identity: &VerifiedIdentity) -> Result<UserRow, AuthError> {
        if let Some(external_id) = &identity.external_id {
            if let Some(user) = self
                .users
                .find_by_external_id(identity.provider, external_id)
                .await?
            {
                return Ok(user);
            }
        }

        if let Some(user) = self.users.find_by_email(&identity.email).await? {
            return self.link(user, identity).await;
        }

        match self
            .users
            .create(CreateUser {
                id: Uuid::new_v4(),
                email: identity.email.clone(),
                provider: identity.provider,
                google_id: matches!(identity.provider, AuthProvider::Google)
                    .then(|| identity.external_id.clone())
                    .flatten(),
                apple_id: matches!(identity.provider, AuthProvider::Apple)
                    .then(|| identity.external_id.clone())
                    .flatten(),
                name: identity.name.clone(),
                picture: identity.picture.clone(),
            })
            .await
        {
            Ok(user) => {
                tracing::info!(user_id = %user.id, provider = %identity.provider, "Created account");
                Ok(user)
            }
            Err(DbError::Duplicate(constraint)) => {
                // Lost a creation race; the row exists now, so link into it.
                tracing::debug!(
                    email = %identity.email,
                    constraint = %constraint,
                    "Concurrent account creation detected, retrying as lookup"
                );
                let user = self
                    .users
                    .find_by_email(&identity.email)
                    .await?
                    .ok_or_else(|| {
                        AuthError::Internal("account vanished after duplicate insert".to_string())
                    })?;
                self.link(user, identity).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Attach the tuple's external id to an email-matched account.
    ///
    /// The id is set at most once per provider: an account that already
    /// carries a different id for this provider is returned unchanged.
    async fn link(&self, user: UserRow, identity: &VerifiedIdentity) -> Result<UserRow, AuthError> {
        let Some(external_id) = &identity.external_id else {
            // OTP tuples carry nothing to attach.
            return Ok(user);
        };

        match user.external_id(identity.provider) {
            None => {
                let updated = self
                    .users
                    .attach_external_id(
                        user.id,
                        identity.provider,
                        external_id,
                        identity.name.as_deref(),
                        identity.picture.as_deref(),
                    )
                    .await?;
                tracing::info!(
                    user_id = %updated.id,
                    provider = %identity.provider,
                    "Linked provider to existing account"
                );
                Ok(updated)
            }
            Some(existing) if existing == external_id => Ok(user),
            Some(_) => {
                tracing::warn!(
                    user_id = %user.id,
                    provider = %identity.provider,
                    "Account already linked to a different external id; keeping existing link"
                );
                Ok(user)
            }
        }
    }
}
