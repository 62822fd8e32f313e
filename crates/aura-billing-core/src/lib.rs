//! Aura Billing Core - Billing business logic
//!
//! Stripe integration, webhook verification, and subscription-state
//! reconciliation against the user store.
//!
//! # Example
//!
//! ```rust,ignore
//! use aura_billing_core::{BillingConfig, StripeClient, SubscriptionReconciler, WebhookHandler};
//!
//! let config = BillingConfig::new("sk_test_...", "whsec_...")
//!     .with_price("monthly", "price_...");
//!
//! let stripe = StripeClient::new(config.clone());
//! let webhooks = WebhookHandler::new(&config.stripe_webhook_secret);
//! let reconciler = SubscriptionReconciler::new(users, stripe.clone());
//!
//! // Webhook path
//! let event = webhooks.verify_and_parse(&payload, signature)?;
//! reconciler.process_event(event).await?;
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod reconciler;
pub mod stripe;
pub mod webhook;

pub use config::BillingConfig;
pub use error::BillingError;
pub use provider::{CheckoutSession, SubscriptionProvider, SubscriptionState};
pub use reconciler::SubscriptionReconciler;
pub use stripe::StripeClient;
pub use webhook::{WebhookEvent, WebhookEventData, WebhookEventType, WebhookHandler};
