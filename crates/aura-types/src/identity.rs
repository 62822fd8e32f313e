//! Verified identity tuples

use crate::provider::AuthProvider;

/// The output of a successful credential verification.
///
/// Every verifier (email OTP, Google, Apple) reduces its external proof to
/// this tuple; the account resolver maps it to a user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Verified email address
    pub email: String,
    /// The method that proved this identity
    pub provider: AuthProvider,
    /// Provider subject id (`sub`); absent for the OTP flow
    pub external_id: Option<String>,
    /// Display name from the provider payload, when present
    pub name: Option<String>,
    /// Avatar URL from the provider payload, when present
    pub picture: Option<String>,
}

impl VerifiedIdentity {
    /// Identity proved by an email one-time code
    pub fn from_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            provider: AuthProvider::Email,
            external_id: None,
            name: None,
            picture: None,
        }
    }
}
