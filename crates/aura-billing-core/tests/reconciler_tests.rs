//! Reconciler behavior against in-memory repositories and a fake provider

use async_trait::async_trait;
use aura_billing_core::{
    BillingError, SubscriptionProvider, SubscriptionReconciler, SubscriptionState, WebhookEvent,
    WebhookEventData, WebhookEventType,
};
use aura_billing_core::webhook::{CheckoutSessionData, InvoiceEventData, SubscriptionEventData};
use aura_billing_core::CheckoutSession;
use aura_db::{
    CreateUser, DbResult, OnboardingFields, SubscriptionPatch, UpdateProfile, UserRepository,
    UserRow,
};
use aura_types::AuthProvider;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Default)]
struct MockUserRepository {
    users: DashMap<Uuid, UserRow>,
}

impl MockUserRepository {
    fn insert(&self, user: UserRow) {
        self.users.insert(user.id, user);
    }

    fn get(&self, id: Uuid) -> UserRow {
        self.users.get(&id).unwrap().clone()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .users
            .iter()
            .find(|r| r.email == email)
            .map(|r| r.clone()))
    }

    async fn find_by_external_id(
        &self,
        _provider: AuthProvider,
        _external_id: &str,
    ) -> DbResult<Option<UserRow>> {
        Ok(None)
    }

    async fn find_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> DbResult<Option<UserRow>> {
        Ok(self
            .users
            .iter()
            .find(|r| r.stripe_subscription_id.as_deref() == Some(subscription_id))
            .map(|r| r.clone()))
    }

    async fn create(&self, _user: CreateUser) -> DbResult<UserRow> {
        unimplemented!("not exercised by reconciler tests")
    }

    async fn attach_external_id(
        &self,
        _id: Uuid,
        _provider: AuthProvider,
        _external_id: &str,
        _name: Option<&str>,
        _picture: Option<&str>,
    ) -> DbResult<UserRow> {
        unimplemented!("not exercised by reconciler tests")
    }

    async fn mark_onboarded(
        &self,
        _id: Uuid,
        _fields: OnboardingFields,
    ) -> DbResult<Option<UserRow>> {
        unimplemented!("not exercised by reconciler tests")
    }

    async fn update_profile(
        &self,
        _id: Uuid,
        _update: UpdateProfile,
    ) -> DbResult<Option<UserRow>> {
        unimplemented!("not exercised by reconciler tests")
    }

    async fn set_stripe_customer_id(&self, _id: Uuid, _customer_id: &str) -> DbResult<()> {
        Ok(())
    }

    async fn apply_subscription_patch(
        &self,
        id: Uuid,
        patch: SubscriptionPatch,
    ) -> DbResult<bool> {
        let Some(mut user) = self.users.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(applied_at) = user.subscription_event_at {
            if applied_at > patch.event_at {
                return Ok(false);
            }
        }
        if let Some(sub_id) = patch.stripe_subscription_id {
            user.stripe_subscription_id = Some(sub_id);
        }
        if let Some(plan) = patch.plan {
            user.subscription_plan = Some(plan);
        }
        user.subscription_status = Some(patch.status);
        if let Some(subscribed) = patch.subscribed {
            user.subscribed = subscribed;
        }
        if let Some(ends_at) = patch.ends_at {
            user.subscription_ends_at = Some(ends_at);
        }
        user.subscription_event_at = Some(patch.event_at);
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        self.users.remove(&id);
        Ok(())
    }
}

/// Fake provider returning a canned subscription state
struct MockProvider {
    state: SubscriptionState,
}

impl MockProvider {
    fn active(subscription_id: &str) -> Self {
        Self {
            state: SubscriptionState {
                subscription_id: subscription_id.to_string(),
                status: "active".to_string(),
                current_period_end: Utc::now() + Duration::days(30),
            },
        }
    }

    fn with_status(subscription_id: &str, status: &str) -> Self {
        Self {
            state: SubscriptionState {
                subscription_id: subscription_id.to_string(),
                status: status.to_string(),
                current_period_end: Utc::now() + Duration::days(30),
            },
        }
    }
}

#[async_trait]
impl SubscriptionProvider for MockProvider {
    async fn create_customer(&self, _email: &str, _user_id: &str) -> Result<String, BillingError> {
        Ok("cus_mock".to_string())
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionState, BillingError> {
        if subscription_id == self.state.subscription_id {
            Ok(self.state.clone())
        } else {
            Err(BillingError::Provider("no such subscription".to_string()))
        }
    }

    async fn cancel_subscription(&self, _subscription_id: &str) -> Result<(), BillingError> {
        Ok(())
    }

    async fn create_checkout_session(
        &self,
        _customer_id: &str,
        _user_id: &str,
        _plan: &str,
    ) -> Result<CheckoutSession, BillingError> {
        Ok(CheckoutSession {
            session_id: "cs_mock".to_string(),
            url: "https://checkout.stripe.com/mock".to_string(),
        })
    }

    async fn create_portal_session(&self, _customer_id: &str) -> Result<String, BillingError> {
        Ok("https://billing.stripe.com/mock".to_string())
    }
}

fn test_user() -> UserRow {
    UserRow {
        id: Uuid::new_v4(),
        email: format!("u-{}@example.com", Uuid::new_v4()),
        google_id: None,
        apple_id: None,
        provider: "email".to_string(),
        name: None,
        picture: None,
        onboarded: true,
        age: None,
        gender: None,
        alpha_level: None,
        notifications: None,
        stripe_customer_id: Some("cus_1".to_string()),
        stripe_subscription_id: None,
        subscribed: false,
        subscription_plan: None,
        subscription_status: None,
        subscription_ends_at: None,
        subscription_event_at: None,
        created_at: Utc::now(),
    }
}

fn checkout_event(user_id: Uuid, subscription_id: &str, created: i64) -> WebhookEvent {
    WebhookEvent {
        id: "evt_checkout".to_string(),
        event_type: WebhookEventType::CheckoutSessionCompleted,
        data: WebhookEventData::CheckoutSession(CheckoutSessionData {
            session_id: "cs_1".to_string(),
            customer_id: "cus_1".to_string(),
            subscription_id: Some(subscription_id.to_string()),
            user_id: Some(user_id.to_string()),
            plan: Some("monthly".to_string()),
        }),
        created,
    }
}

fn subscription_event(
    event_type: WebhookEventType,
    subscription_id: &str,
    status: &str,
    created: i64,
) -> WebhookEvent {
    WebhookEvent {
        id: "evt_sub".to_string(),
        event_type,
        data: WebhookEventData::Subscription(SubscriptionEventData {
            subscription_id: subscription_id.to_string(),
            customer_id: "cus_1".to_string(),
            status: status.to_string(),
            period_end: Utc::now() + Duration::days(30),
            cancel_at_period_end: false,
        }),
        created,
    }
}

// ============================================================================
// Webhook path
// ============================================================================

#[tokio::test]
async fn checkout_completed_attaches_subscription() {
    let users = Arc::new(MockUserRepository::default());
    let user = test_user();
    users.insert(user.clone());

    let reconciler =
        SubscriptionReconciler::new(Arc::clone(&users), Arc::new(MockProvider::active("sub_1")));

    reconciler
        .process_event(checkout_event(user.id, "sub_1", Utc::now().timestamp()))
        .await
        .unwrap();

    let updated = users.get(user.id);
    assert!(updated.subscribed);
    assert_eq!(updated.stripe_subscription_id.as_deref(), Some("sub_1"));
    assert_eq!(updated.subscription_plan.as_deref(), Some("monthly"));
    assert_eq!(updated.subscription_status.as_deref(), Some("active"));
    assert!(updated.subscription_ends_at.is_some());
}

#[tokio::test]
async fn subscription_deleted_revokes_access() {
    let users = Arc::new(MockUserRepository::default());
    let mut user = test_user();
    user.stripe_subscription_id = Some("sub_1".to_string());
    user.subscribed = true;
    user.subscription_status = Some("active".to_string());
    users.insert(user.clone());

    let reconciler =
        SubscriptionReconciler::new(Arc::clone(&users), Arc::new(MockProvider::active("sub_1")));

    reconciler
        .process_event(subscription_event(
            WebhookEventType::CustomerSubscriptionDeleted,
            "sub_1",
            "canceled",
            Utc::now().timestamp(),
        ))
        .await
        .unwrap();

    let updated = users.get(user.id);
    assert!(!updated.subscribed);
    assert_eq!(updated.subscription_status.as_deref(), Some("canceled"));
}

#[tokio::test]
async fn invoice_payment_failed_only_flags_past_due() {
    let users = Arc::new(MockUserRepository::default());
    let mut user = test_user();
    let period_end = Utc.timestamp_opt(Utc::now().timestamp() + 86400, 0).unwrap();
    user.stripe_subscription_id = Some("sub_1".to_string());
    user.subscribed = true;
    user.subscription_status = Some("active".to_string());
    user.subscription_ends_at = Some(period_end);
    users.insert(user.clone());

    let reconciler =
        SubscriptionReconciler::new(Arc::clone(&users), Arc::new(MockProvider::active("sub_1")));

    reconciler
        .process_event(WebhookEvent {
            id: "evt_inv".to_string(),
            event_type: WebhookEventType::InvoicePaymentFailed,
            data: WebhookEventData::Invoice(InvoiceEventData {
                invoice_id: "in_1".to_string(),
                customer_id: "cus_1".to_string(),
                subscription_id: Some("sub_1".to_string()),
            }),
            created: Utc::now().timestamp(),
        })
        .await
        .unwrap();

    let updated = users.get(user.id);
    assert_eq!(updated.subscription_status.as_deref(), Some("past_due"));
    // Access and period end are decided by subscription events, not invoices
    assert!(updated.subscribed);
    assert_eq!(updated.subscription_ends_at, Some(period_end));
}

#[tokio::test]
async fn unknown_subscription_is_acknowledged_without_change() {
    let users = Arc::new(MockUserRepository::default());
    let user = test_user();
    users.insert(user.clone());

    let reconciler =
        SubscriptionReconciler::new(Arc::clone(&users), Arc::new(MockProvider::active("sub_1")));

    // Event for a subscription nobody carries: no error, no state change
    reconciler
        .process_event(subscription_event(
            WebhookEventType::CustomerSubscriptionUpdated,
            "sub_unknown",
            "active",
            Utc::now().timestamp(),
        ))
        .await
        .unwrap();

    let unchanged = users.get(user.id);
    assert!(!unchanged.subscribed);
    assert!(unchanged.subscription_status.is_none());
}

#[tokio::test]
async fn stale_event_is_discarded() {
    let users = Arc::new(MockUserRepository::default());
    let mut user = test_user();
    user.stripe_subscription_id = Some("sub_1".to_string());
    users.insert(user.clone());

    let reconciler =
        SubscriptionReconciler::new(Arc::clone(&users), Arc::new(MockProvider::active("sub_1")));

    let now = Utc::now().timestamp();

    // Deletion event arrives first (newer)
    reconciler
        .process_event(subscription_event(
            WebhookEventType::CustomerSubscriptionDeleted,
            "sub_1",
            "canceled",
            now,
        ))
        .await
        .unwrap();

    // An older "active" update is delivered late and must not resurrect access
    reconciler
        .process_event(subscription_event(
            WebhookEventType::CustomerSubscriptionUpdated,
            "sub_1",
            "active",
            now - 120,
        ))
        .await
        .unwrap();

    let final_state = users.get(user.id);
    assert!(!final_state.subscribed);
    assert_eq!(final_state.subscription_status.as_deref(), Some("canceled"));
}

// ============================================================================
// Poll path
// ============================================================================

#[tokio::test]
async fn sync_overwrites_from_provider_state() {
    let users = Arc::new(MockUserRepository::default());
    let mut user = test_user();
    user.stripe_subscription_id = Some("sub_1".to_string());
    user.subscribed = true;
    user.subscription_status = Some("active".to_string());
    users.insert(user.clone());

    let reconciler = SubscriptionReconciler::new(
        Arc::clone(&users),
        Arc::new(MockProvider::with_status("sub_1", "past_due")),
    );

    let synced = reconciler.sync(&users.get(user.id)).await.unwrap();
    assert_eq!(synced.subscription_status.as_deref(), Some("past_due"));
    assert!(!synced.subscribed);
}

#[tokio::test]
async fn sync_without_subscription_fails() {
    let users = Arc::new(MockUserRepository::default());
    let user = test_user();
    users.insert(user.clone());

    let reconciler =
        SubscriptionReconciler::new(Arc::clone(&users), Arc::new(MockProvider::active("sub_1")));

    let result = reconciler.sync(&users.get(user.id)).await;
    assert!(matches!(result, Err(BillingError::NoSubscription)));
}
