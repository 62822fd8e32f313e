//! Subscription lifecycle status

/// Subscription status mirroring the payment provider's lifecycle strings.
///
/// The provider's status is stored as free text on the user row; this enum is
/// the typed view. Unrecognized values are carried through verbatim rather
/// than rejected, so a provider-side addition never breaks reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Unpaid,
    Paused,
    /// Passthrough for statuses this build does not know about
    Unknown(String),
}

impl SubscriptionStatus {
    /// Parse a provider status string
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            "incomplete" => Self::Incomplete,
            "incomplete_expired" => Self::IncompleteExpired,
            "unpaid" => Self::Unpaid,
            "paused" => Self::Paused,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Stable string form, as stored in the database
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Unpaid => "unpaid",
            Self::Paused => "paused",
            Self::Unknown(s) => s,
        }
    }

    /// Whether this status grants access.
    ///
    /// `subscribed` on the user row must equal this for the most recently
    /// applied status write.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
