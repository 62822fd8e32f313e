//! Payment provider abstraction

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::BillingError;

/// A checkout session handed back to the client
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Session ID
    pub session_id: String,
    /// Hosted checkout URL
    pub url: String,
}

/// Authoritative subscription state as reported by the provider
#[derive(Debug, Clone)]
pub struct SubscriptionState {
    /// Subscription ID
    pub subscription_id: String,
    /// Provider status string
    pub status: String,
    /// Current billing-period end
    pub current_period_end: DateTime<Utc>,
}

/// Payment provider trait
///
/// Abstracts the payment processor so the reconciler and handlers can run
/// against a fake in tests.
#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    /// Create a billing customer for a user; returns the customer id
    async fn create_customer(&self, email: &str, user_id: &str) -> Result<String, BillingError>;

    /// Fetch the live state of a subscription
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionState, BillingError>;

    /// Cancel a subscription immediately
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), BillingError>;

    /// Create a checkout session for the given plan
    async fn create_checkout_session(
        &self,
        customer_id: &str,
        user_id: &str,
        plan: &str,
    ) -> Result<CheckoutSession, BillingError>;

    /// Create a customer portal session; returns the portal URL
    async fn create_portal_session(&self, customer_id: &str) -> Result<String, BillingError>;
}
