//! Stripe webhook handling

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument, warn};

use crate::error::BillingError;

/// Webhook event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// Checkout session completed
    CheckoutSessionCompleted,
    /// Customer subscription updated
    CustomerSubscriptionUpdated,
    /// Customer subscription deleted
    CustomerSubscriptionDeleted,
    /// Invoice payment failed
    InvoicePaymentFailed,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for WebhookEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.updated" => Self::CustomerSubscriptionUpdated,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: WebhookEventType,
    /// Event data
    pub data: WebhookEventData,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

impl WebhookEvent {
    /// Event creation time as a timestamp, for the reconciler's recency guard
    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.created, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Webhook event data, validated at the boundary
#[derive(Debug, Clone)]
pub enum WebhookEventData {
    /// Checkout session data
    CheckoutSession(CheckoutSessionData),
    /// Subscription data
    Subscription(SubscriptionEventData),
    /// Invoice data
    Invoice(InvoiceEventData),
    /// Raw JSON for unknown events
    Raw(serde_json::Value),
}

/// Checkout session completed data
#[derive(Debug, Clone)]
pub struct CheckoutSessionData {
    /// Session ID
    pub session_id: String,
    /// Customer ID
    pub customer_id: String,
    /// Subscription ID
    pub subscription_id: Option<String>,
    /// The purchasing user's id, set as metadata when checkout was created
    pub user_id: Option<String>,
    /// The purchased plan name from session metadata
    pub plan: Option<String>,
}

/// Subscription event data
#[derive(Debug, Clone)]
pub struct SubscriptionEventData {
    /// Subscription ID
    pub subscription_id: String,
    /// Customer ID
    pub customer_id: String,
    /// Status
    pub status: String,
    /// Current period end
    pub period_end: DateTime<Utc>,
    /// Whether it cancels at period end
    pub cancel_at_period_end: bool,
}

/// Invoice event data
#[derive(Debug, Clone)]
pub struct InvoiceEventData {
    /// Invoice ID
    pub invoice_id: String,
    /// Customer ID
    pub customer_id: String,
    /// Subscription ID
    pub subscription_id: Option<String>,
}

/// Webhook handler for verifying and parsing Stripe events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a webhook payload
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, BillingError> {
        self.verify_signature(payload, signature)?;

        let raw_event: RawStripeEvent = serde_json::from_slice(payload)
            .map_err(|e| BillingError::Webhook(e.to_string()))?;

        debug!(event_id = %raw_event.id, event_type = %raw_event.event_type, "Parsed webhook event");

        let event_type = WebhookEventType::from(raw_event.event_type.as_str());
        let data = Self::parse_event_data(&event_type, raw_event.data.object)?;

        Ok(WebhookEvent {
            id: raw_event.id,
            event_type,
            data,
            created: raw_event.created,
        })
    }

    /// Verify a Stripe webhook signature header (`t=timestamp,v1=signature`)
    fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<(), BillingError> {
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            BillingError::Webhook("Missing timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature");
            BillingError::Webhook("Missing signature".to_string())
        })?;

        let signed_payload = format!(
            "{}.{}",
            timestamp,
            std::str::from_utf8(payload)
                .map_err(|_| BillingError::Webhook("Invalid payload encoding".to_string()))?
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| BillingError::Internal("HMAC error".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            error!("Webhook signature verification failed");
            return Err(BillingError::Webhook(
                "Signature verification failed".to_string(),
            ));
        }

        // Freshness window: 5 minutes either way
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| BillingError::Webhook("Invalid timestamp format".to_string()))?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > 300 {
            warn!(timestamp = ts, now = now, "Webhook timestamp too old");
            return Err(BillingError::Webhook("Timestamp too old".to_string()));
        }

        Ok(())
    }

    /// Parse event data based on type
    fn parse_event_data(
        event_type: &WebhookEventType,
        object: serde_json::Value,
    ) -> Result<WebhookEventData, BillingError> {
        match event_type {
            WebhookEventType::CheckoutSessionCompleted => {
                let session: RawCheckoutSession = serde_json::from_value(object)
                    .map_err(|e| BillingError::Webhook(e.to_string()))?;
                Ok(WebhookEventData::CheckoutSession(CheckoutSessionData {
                    session_id: session.id,
                    customer_id: session.customer.unwrap_or_default(),
                    subscription_id: session.subscription,
                    user_id: session.metadata.get("userId").cloned(),
                    plan: session.metadata.get("plan").cloned(),
                }))
            }
            WebhookEventType::CustomerSubscriptionUpdated
            | WebhookEventType::CustomerSubscriptionDeleted => {
                let sub: RawSubscription = serde_json::from_value(object)
                    .map_err(|e| BillingError::Webhook(e.to_string()))?;
                Ok(WebhookEventData::Subscription(SubscriptionEventData {
                    subscription_id: sub.id,
                    customer_id: sub.customer,
                    status: sub.status,
                    period_end: Utc
                        .timestamp_opt(sub.current_period_end, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                    cancel_at_period_end: sub.cancel_at_period_end,
                }))
            }
            WebhookEventType::InvoicePaymentFailed => {
                let inv: RawInvoice = serde_json::from_value(object)
                    .map_err(|e| BillingError::Webhook(e.to_string()))?;
                Ok(WebhookEventData::Invoice(InvoiceEventData {
                    invoice_id: inv.id,
                    customer_id: inv.customer,
                    subscription_id: inv.subscription,
                }))
            }
            WebhookEventType::Unknown(name) => {
                info!(event_type = %name, "Received unhandled webhook event type");
                Ok(WebhookEventData::Raw(object))
            }
        }
    }
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Raw Stripe payloads, trusted only after signature verification

#[derive(Debug, Deserialize)]
struct RawStripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    id: String,
    customer: Option<String>,
    subscription: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawSubscription {
    id: String,
    customer: String,
    status: String,
    current_period_end: i64,
    #[serde(default)]
    cancel_at_period_end: bool,
}

#[derive(Debug, Deserialize)]
struct RawInvoice {
    id: String,
    customer: String,
    subscription: Option<String>,
}
