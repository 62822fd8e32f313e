//! Authentication provider tags

use serde::{Deserialize, Serialize};

/// The credential method used when an account was created.
///
/// Informational only: an account created via one provider may later link
/// additional providers by email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email one-time code
    Email,
    /// Google Sign-In
    Google,
    /// Sign in with Apple
    Apple,
}

impl AuthProvider {
    /// Stable string form, as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Google => "google",
            Self::Apple => "apple",
        }
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "google" => Ok(Self::Google),
            "apple" => Ok(Self::Apple),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Error for unrecognized provider strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProvider(pub String);

impl std::fmt::Display for UnknownProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown auth provider: {}", self.0)
    }
}

impl std::error::Error for UnknownProvider {}
