//! Billing configuration

use std::collections::HashMap;

/// Billing service configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
    /// Map of plan names to Stripe price IDs
    pub price_ids: HashMap<String, String>,
    /// Success URL for checkout
    pub success_url: String,
    /// Cancel URL for checkout
    pub cancel_url: String,
    /// Return URL for the billing portal
    pub portal_return_url: String,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(
        stripe_secret_key: impl Into<String>,
        stripe_webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            stripe_secret_key: stripe_secret_key.into(),
            stripe_webhook_secret: stripe_webhook_secret.into(),
            price_ids: HashMap::new(),
            success_url: "https://app.example.com/billing/success".to_string(),
            cancel_url: "https://app.example.com/billing/cancel".to_string(),
            portal_return_url: "https://app.example.com/settings".to_string(),
        }
    }

    /// Set the price ID for a plan
    pub fn with_price(mut self, plan: impl Into<String>, price_id: impl Into<String>) -> Self {
        self.price_ids.insert(plan.into(), price_id.into());
        self
    }

    /// Set checkout URLs
    pub fn with_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
        portal_return_url: impl Into<String>,
    ) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self.portal_return_url = portal_return_url.into();
        self
    }

    /// Get the price ID for a plan
    pub fn get_price_id(&self, plan: &str) -> Option<&str> {
        self.price_ids.get(plan).map(String::as_str)
    }
}
