//! HTTP route handlers

pub mod auth;
pub mod billing;
pub mod conversations;
pub mod health;
pub mod usage;
pub mod user;

use aura_db::UserRow;
use serde::Serialize;

/// User representation returned to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub provider: String,
    pub onboarded: bool,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub alpha_level: Option<String>,
    pub notifications: Option<bool>,
    pub subscribed: bool,
    pub subscription_plan: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_ends_at: Option<String>,
    pub created_at: String,
}

impl From<UserRow> for UserBody {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            name: user.name,
            picture: user.picture,
            provider: user.provider,
            onboarded: user.onboarded,
            age: user.age,
            gender: user.gender,
            alpha_level: user.alpha_level,
            notifications: user.notifications,
            subscribed: user.subscribed,
            subscription_plan: user.subscription_plan,
            subscription_status: user.subscription_status,
            subscription_ends_at: user.subscription_ends_at.map(|t| t.to_rfc3339()),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}
