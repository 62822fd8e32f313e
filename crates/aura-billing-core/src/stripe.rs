//! Stripe payment provider implementation

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{CheckoutSession, SubscriptionProvider, SubscriptionState};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe client speaking the form-encoded REST API directly
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: BillingConfig,
    api_base: String,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(config: BillingConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            api_base: STRIPE_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API base (tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Make an authenticated request to Stripe
    async fn stripe_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<T, BillingError> {
        let url = format!("{}{endpoint}", self.api_base);

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.config.stripe_secret_key, Option::<&str>::None);

        if let Some(form_data) = form {
            request = request.form(form_data);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Stripe API request failed");
            BillingError::Provider(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Stripe API error");
            return Err(BillingError::Provider(format!("Stripe API error: {status}")));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Stripe response");
            BillingError::Internal(e.to_string())
        })
    }
}

#[async_trait]
impl SubscriptionProvider for StripeClient {
    #[instrument(skip(self))]
    async fn create_customer(&self, email: &str, user_id: &str) -> Result<String, BillingError> {
        debug!(email = %email, "Creating Stripe customer");

        let form = [("email", email), ("metadata[userId]", user_id)];

        let customer: StripeCustomer = self
            .stripe_request(reqwest::Method::POST, "/customers", Some(&form))
            .await?;

        Ok(customer.id)
    }

    #[instrument(skip(self))]
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionState, BillingError> {
        debug!(subscription_id = %subscription_id, "Getting Stripe subscription");

        let sub: StripeSubscription = self
            .stripe_request(
                reqwest::Method::GET,
                &format!("/subscriptions/{subscription_id}"),
                None,
            )
            .await?;

        Ok(sub.into_state())
    }

    #[instrument(skip(self))]
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), BillingError> {
        debug!(subscription_id = %subscription_id, "Canceling subscription");

        let _: StripeSubscription = self
            .stripe_request(
                reqwest::Method::DELETE,
                &format!("/subscriptions/{subscription_id}"),
                None,
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_checkout_session(
        &self,
        customer_id: &str,
        user_id: &str,
        plan: &str,
    ) -> Result<CheckoutSession, BillingError> {
        debug!(customer_id = %customer_id, plan = %plan, "Creating checkout session");

        let price_id = self
            .config
            .get_price_id(plan)
            .ok_or_else(|| BillingError::UnknownPlan(plan.to_string()))?;

        let form = [
            ("customer", customer_id),
            ("mode", "subscription"),
            ("success_url", self.config.success_url.as_str()),
            ("cancel_url", self.config.cancel_url.as_str()),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("metadata[userId]", user_id),
            ("metadata[plan]", plan),
        ];

        let session: StripeCheckoutSession = self
            .stripe_request(reqwest::Method::POST, "/checkout/sessions", Some(&form))
            .await?;

        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url.unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    async fn create_portal_session(&self, customer_id: &str) -> Result<String, BillingError> {
        debug!(customer_id = %customer_id, "Creating portal session");

        let form = [
            ("customer", customer_id),
            ("return_url", self.config.portal_return_url.as_str()),
        ];

        let session: StripeBillingPortalSession = self
            .stripe_request(
                reqwest::Method::POST,
                "/billing_portal/sessions",
                Some(&form),
            )
            .await?;

        Ok(session.url)
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

// Stripe API response types

/// Stripe customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCustomer {
    /// Customer ID
    pub id: String,
    /// Customer email
    pub email: Option<String>,
}

/// Stripe subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeSubscription {
    /// Subscription ID
    pub id: String,
    /// Customer ID
    pub customer: String,
    /// Subscription status
    pub status: String,
    /// Current period end (Unix timestamp)
    pub current_period_end: i64,
    /// Whether subscription cancels at period end
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

impl StripeSubscription {
    /// Reduce to the fields reconciliation cares about
    pub fn into_state(self) -> SubscriptionState {
        SubscriptionState {
            subscription_id: self.id,
            status: self.status,
            current_period_end: Utc
                .timestamp_opt(self.current_period_end, 0)
                .single()
                .unwrap_or_else(Utc::now),
        }
    }
}

/// Stripe checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session ID
    pub id: String,
    /// Hosted checkout URL
    pub url: Option<String>,
    /// Customer ID
    pub customer: Option<String>,
    /// Subscription ID (after completion)
    pub subscription: Option<String>,
}

/// Stripe billing portal session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeBillingPortalSession {
    /// Session ID
    pub id: String,
    /// Portal URL
    pub url: String,
}
