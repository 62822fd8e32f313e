//! Mock repositories and mailer for testing

use async_trait::async_trait;
use aura_auth_core::{MailError, Mailer};
use aura_db::{
    CreateUser, CreateVerificationToken, DbError, DbResult, OnboardingFields, SubscriptionPatch,
    UpdateProfile, UserRepository, UserRow, VerificationTokenRepository,
};
use aura_types::AuthProvider;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
    /// When set, the next create inserts this row (as if a concurrent
    /// request won the race) and fails with a duplicate error.
    race_winner: Arc<Mutex<Option<UserRow>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test user directly
    pub fn insert_user(&self, user: UserRow) {
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
    }

    /// Simulate losing a creation race: the next `create` call inserts the
    /// given row and returns `DbError::Duplicate`.
    pub fn lose_next_create_race_to(&self, winner: UserRow) {
        *self.race_winner.lock().unwrap() = Some(winner);
    }

    /// Build a bare user row for a given email
    pub fn test_user(email: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            google_id: None,
            apple_id: None,
            provider: "email".to_string(),
            name: None,
            picture: None,
            onboarded: false,
            age: None,
            gender: None,
            alpha_level: None,
            notifications: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            subscribed: false,
            subscription_plan: None,
            subscription_status: None,
            subscription_ends_at: None,
            subscription_event_at: None,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }

    async fn find_by_external_id(
        &self,
        provider: AuthProvider,
        external_id: &str,
    ) -> DbResult<Option<UserRow>> {
        Ok(self
            .users
            .iter()
            .find(|r| r.value().external_id(provider) == Some(external_id))
            .map(|r| r.value().clone()))
    }

    async fn find_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> DbResult<Option<UserRow>> {
        Ok(self
            .users
            .iter()
            .find(|r| r.value().stripe_subscription_id.as_deref() == Some(subscription_id))
            .map(|r| r.value().clone()))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        if let Some(winner) = self.race_winner.lock().unwrap().take() {
            self.insert_user(winner);
            return Err(DbError::Duplicate("users_email_key".to_string()));
        }

        if self.by_email.contains_key(&user.email) {
            return Err(DbError::Duplicate("users_email_key".to_string()));
        }

        let row = UserRow {
            id: user.id,
            email: user.email,
            google_id: user.google_id,
            apple_id: user.apple_id,
            provider: user.provider.as_str().to_string(),
            name: user.name,
            picture: user.picture,
            onboarded: false,
            age: None,
            gender: None,
            alpha_level: None,
            notifications: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            subscribed: false,
            subscription_plan: None,
            subscription_status: None,
            subscription_ends_at: None,
            subscription_event_at: None,
            created_at: Utc::now(),
        };
        self.insert_user(row.clone());
        Ok(row)
    }

    async fn attach_external_id(
        &self,
        id: Uuid,
        provider: AuthProvider,
        external_id: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> DbResult<UserRow> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        match provider {
            AuthProvider::Google => user.google_id = Some(external_id.to_string()),
            AuthProvider::Apple => user.apple_id = Some(external_id.to_string()),
            AuthProvider::Email => {}
        }
        if let Some(name) = name {
            user.name = Some(name.to_string());
        }
        if let Some(picture) = picture {
            user.picture = Some(picture.to_string());
        }
        Ok(user.clone())
    }

    async fn mark_onboarded(
        &self,
        id: Uuid,
        fields: OnboardingFields,
    ) -> DbResult<Option<UserRow>> {
        let Some(mut user) = self.users.get_mut(&id) else {
            return Ok(None);
        };
        if user.onboarded {
            return Ok(None);
        }
        user.onboarded = true;
        if let Some(name) = fields.name {
            user.name = Some(name);
        }
        if let Some(age) = fields.age {
            user.age = Some(age);
        }
        if let Some(gender) = fields.gender {
            user.gender = Some(gender);
        }
        if let Some(alpha_level) = fields.alpha_level {
            user.alpha_level = Some(alpha_level);
        }
        if let Some(notifications) = fields.notifications {
            user.notifications = Some(notifications);
        }
        Ok(Some(user.clone()))
    }

    async fn update_profile(&self, id: Uuid, update: UpdateProfile) -> DbResult<Option<UserRow>> {
        let Some(mut user) = self.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            user.name = Some(name);
        }
        if let Some(age) = update.age {
            user.age = Some(age);
        }
        if let Some(gender) = update.gender {
            user.gender = Some(gender);
        }
        if let Some(alpha_level) = update.alpha_level {
            user.alpha_level = Some(alpha_level);
        }
        if let Some(notifications) = update.notifications {
            user.notifications = Some(notifications);
        }
        Ok(Some(user.clone()))
    }

    async fn set_stripe_customer_id(&self, id: Uuid, customer_id: &str) -> DbResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.stripe_customer_id = Some(customer_id.to_string());
        }
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
        if let Some((_, user)) = self.users.remove(&id) {
            self.by_email.remove(&user.email);
        }
        Ok(())
    }
}

/// In-memory verification token repository for testing
#[derive(Default, Clone)]
pub struct MockVerificationTokenRepository {
    rows: Arc<Mutex<Vec<(String, String, DateTime<Utc>)>>>,
}

impl MockVerificationTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token row directly
    pub fn insert(&self, identifier: &str, token: &str, expires: DateTime<Utc>) {
        self.rows
            .lock()
            .unwrap()
            .push((identifier.to_string(), token.to_string(), expires));
    }

    /// Number of live rows
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl VerificationTokenRepository for MockVerificationTokenRepository {
    async fn create(&self, token: CreateVerificationToken) -> DbResult<()> {
        self.rows
            .lock()
            .unwrap()
            .push((token.identifier, token.token, token.expires));
        Ok(())
    }

    async fn consume(&self, identifier: &str, token: &str) -> DbResult<Vec<DateTime<Utc>>> {
        let mut rows = self.rows.lock().unwrap();
        let (matched, kept): (Vec<_>, Vec<_>) = rows
            .drain(..)
            .partition(|(i, t, _)| i == identifier && t == token);
        *rows = kept;
        Ok(matched.into_iter().map(|(_, _, expires)| expires).collect())
    }
}

/// Mailer that records every send; can be switched to fail
#[derive(Default, Clone)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last code sent to the given address
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(addr, _)| addr == to)
            .map(|(_, code)| code.clone())
    }

    /// Every code sent to the given address, oldest first
    pub fn codes_for(&self, to: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(addr, _)| addr == to)
            .map(|(_, code)| code.clone())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Make subsequent sends fail
    pub fn fail_sends(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_otp(&self, to: &str, code: &str) -> Result<(), MailError> {
        if *self.fail.lock().unwrap() {
            return Err(MailError::SendFailed("smtp unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        Ok(())
    }
}
