//! Subscription-state reconciliation
//!
//! Two independent writers feed the subscription fields of a user row: the
//! provider's webhooks and client-triggered polling. Every write carries the
//! source event's timestamp and lands through a conditional update that
//! discards anything older than the last applied event, so out-of-order
//! webhook delivery cannot roll the state backwards.

use aura_db::{SubscriptionPatch, UserRepository, UserRow};
use aura_types::SubscriptionStatus;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::BillingError;
use crate::provider::SubscriptionProvider;
use crate::webhook::{
    CheckoutSessionData, InvoiceEventData, SubscriptionEventData, WebhookEvent, WebhookEventData,
};

/// Subscription reconciler
pub struct SubscriptionReconciler<U, P> {
    users: Arc<U>,
    provider: Arc<P>,
}

impl<U: UserRepository, P: SubscriptionProvider> SubscriptionReconciler<U, P> {
    /// Create a new reconciler
    pub fn new(users: Arc<U>, provider: Arc<P>) -> Self {
        Self { users, provider }
    }

    /// Apply a verified webhook event.
    ///
    /// A user that cannot be located for an event is logged and the event is
    /// acknowledged; surfacing an error would only provoke provider retries
    /// for a row that does not exist.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn process_event(&self, event: WebhookEvent) -> Result<(), BillingError> {
        let event_at = event.created_at();

        match event.data {
            WebhookEventData::CheckoutSession(data) => {
                self.handle_checkout_completed(data, event_at).await
            }
            WebhookEventData::Subscription(data) => match event.event_type {
                crate::webhook::WebhookEventType::CustomerSubscriptionDeleted => {
                    self.handle_subscription_deleted(data, event_at).await
                }
                _ => self.handle_subscription_updated(data, event_at).await,
            },
            WebhookEventData::Invoice(data) => {
                self.handle_invoice_payment_failed(data, event_at).await
            }
            WebhookEventData::Raw(_) => Ok(()),
        }
    }

    /// Checkout completed: attach the subscription and seed its state from
    /// the freshly retrieved subscription object.
    async fn handle_checkout_completed(
        &self,
        data: CheckoutSessionData,
        event_at: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        let Some(user_id) = data.user_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()) else {
            warn!(session_id = %data.session_id, "Checkout session without usable userId metadata");
            return Ok(());
        };

        let Some(subscription_id) = data.subscription_id else {
            warn!(session_id = %data.session_id, "Checkout session completed without a subscription");
            return Ok(());
        };

        if self.users.find_by_id(user_id).await?.is_none() {
            warn!(user_id = %user_id, "Checkout completed for unknown user");
            return Ok(());
        }

        // The session payload doesn't carry subscription state; fetch it.
        let state = self.provider.get_subscription(&subscription_id).await?;

        let applied = self
            .users
            .apply_subscription_patch(
                user_id,
                SubscriptionPatch {
                    stripe_subscription_id: Some(subscription_id.clone()),
                    plan: data.plan,
                    status: state.status.clone(),
                    subscribed: Some(true),
                    ends_at: Some(state.current_period_end),
                    event_at,
                },
            )
            .await?;

        if applied {
            info!(user_id = %user_id, subscription_id = %subscription_id, "Checkout completed, subscription attached");
        } else {
            warn!(user_id = %user_id, "Stale checkout event discarded");
        }

        Ok(())
    }

    /// Subscription updated: overwrite status, period end, and the derived
    /// `subscribed` flag from the event payload.
    async fn handle_subscription_updated(
        &self,
        data: SubscriptionEventData,
        event_at: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        let Some(user) = self
            .users
            .find_by_stripe_subscription_id(&data.subscription_id)
            .await?
        else {
            info!(subscription_id = %data.subscription_id, "Subscription event for unknown user, acknowledging");
            return Ok(());
        };

        let status = SubscriptionStatus::parse(&data.status);
        let applied = self
            .users
            .apply_subscription_patch(
                user.id,
                SubscriptionPatch {
                    stripe_subscription_id: None,
                    plan: None,
                    status: status.as_str().to_string(),
                    subscribed: Some(status.is_active()),
                    ends_at: Some(data.period_end),
                    event_at,
                },
            )
            .await?;

        if applied {
            info!(user_id = %user.id, status = %status, "Subscription state updated");
        } else {
            warn!(user_id = %user.id, "Stale subscription update discarded");
        }

        Ok(())
    }

    /// Subscription deleted: access ends now.
    async fn handle_subscription_deleted(
        &self,
        data: SubscriptionEventData,
        event_at: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        let Some(user) = self
            .users
            .find_by_stripe_subscription_id(&data.subscription_id)
            .await?
        else {
            info!(subscription_id = %data.subscription_id, "Deletion event for unknown user, acknowledging");
            return Ok(());
        };

        let applied = self
            .users
            .apply_subscription_patch(
                user.id,
                SubscriptionPatch {
                    stripe_subscription_id: None,
                    plan: None,
                    status: SubscriptionStatus::Canceled.as_str().to_string(),
                    subscribed: Some(false),
                    ends_at: None,
                    event_at,
                },
            )
            .await?;

        if applied {
            info!(user_id = %user.id, "Subscription canceled");
        } else {
            warn!(user_id = %user.id, "Stale deletion event discarded");
        }

        Ok(())
    }

    /// Invoice payment failed: flag the account past due. Leaves `subscribed`
    /// and the period end untouched; the subsequent subscription event
    /// decides access.
    async fn handle_invoice_payment_failed(
        &self,
        data: InvoiceEventData,
        event_at: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        let Some(subscription_id) = data.subscription_id else {
            info!(invoice_id = %data.invoice_id, "Payment failure for non-subscription invoice, acknowledging");
            return Ok(());
        };

        let Some(user) = self
            .users
            .find_by_stripe_subscription_id(&subscription_id)
            .await?
        else {
            info!(subscription_id = %subscription_id, "Payment failure for unknown user, acknowledging");
            return Ok(());
        };

        let applied = self
            .users
            .apply_subscription_patch(
                user.id,
                SubscriptionPatch {
                    stripe_subscription_id: None,
                    plan: None,
                    status: SubscriptionStatus::PastDue.as_str().to_string(),
                    subscribed: None,
                    ends_at: None,
                    event_at,
                },
            )
            .await?;

        if applied {
            warn!(user_id = %user.id, "Invoice payment failed, account past due");
        }

        Ok(())
    }

    /// Poll path: re-fetch the subscription from the provider and overwrite
    /// local state, stamped with the current time.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn sync(&self, user: &UserRow) -> Result<UserRow, BillingError> {
        let Some(subscription_id) = user.stripe_subscription_id.as_deref() else {
            return Err(BillingError::NoSubscription);
        };

        let state = self.provider.get_subscription(subscription_id).await?;
        let status = SubscriptionStatus::parse(&state.status);

        self.users
            .apply_subscription_patch(
                user.id,
                SubscriptionPatch {
                    stripe_subscription_id: None,
                    plan: None,
                    status: status.as_str().to_string(),
                    subscribed: Some(status.is_active()),
                    ends_at: Some(state.current_period_end),
                    event_at: Utc::now(),
                },
            )
            .await?;

        self.users
            .find_by_id(user.id)
            .await?
            .ok_or(BillingError::UserNotFound)
    }
}

impl<U, P> std::fmt::Debug for SubscriptionReconciler<U, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionReconciler").finish_non_exhaustive()
    }
}
