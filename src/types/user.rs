/**
 * User Types
 *
 * Members of the signal feed, mirrored from the hosting platform's
 * membership webhooks.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a member inside the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Subscriber,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Subscriber => "SUBSCRIBER",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "ADMIN" => UserRole::Admin,
            _ => UserRole::Subscriber,
        }
    }
}

/// A member record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Identity on the hosting platform (unique)
    pub whop_user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub product_id: Option<String>,
    pub membership_id: Option<String>,
    /// False once the membership was deleted
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written when a membership is created or updated.
#[derive(Debug, Clone)]
pub struct UpsertUser {
    pub whop_user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub product_id: Option<String>,
    pub membership_id: Option<String>,
}

impl User {
    pub fn new(data: UpsertUser) -> Self {
        let now = super::utc_now_ms();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            whop_user_id: data.whop_user_id,
            name: data.name,
            email: data.email,
            role: data.role,
            product_id: data.product_id,
            membership_id: data.membership_id,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Access level resolved for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Admin,
    Customer,
    NoAccess,
}

/// Caller identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub access_level: AccessLevel,
    pub user: User,
}
