//! Membership webhook payloads from the hosting platform.

use serde::{Deserialize, Serialize};

/// Envelope of every webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// `data` of `membership_created` / `membership_updated` / `membership_deleted`.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipData {
    pub user_id: String,
    #[serde(default)]
    pub user: WebhookUser,
    #[serde(default)]
    pub product: WebhookProduct,
    #[serde(default)]
    pub membership: WebhookMembership,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookUser {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl WebhookUser {
    /// Display name, falling back to the username.
    pub fn display_name(&self) -> Option<String> {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.username.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookProduct {
    pub id: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookMembership {
    pub id: Option<String>,
}

/// Acknowledgement returned to the platform.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
}
