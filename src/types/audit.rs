//! Audit log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: String,
    /// e.g. `signal_created`, `signal_read`, `whop_webhook_membership_created`
    pub action: String,
    pub user_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when recording an action.
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub action: String,
    pub user_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub metadata: serde_json::Value,
}

impl NewAuditLog {
    /// An action performed by a user on a signal.
    pub fn signal(action: &str, user_id: &str, signal_id: &str, metadata: serde_json::Value) -> Self {
        Self {
            action: action.to_string(),
            user_id: Some(user_id.to_string()),
            resource_type: Some("signal".to_string()),
            resource_id: Some(signal_id.to_string()),
            metadata,
        }
    }

    /// A webhook delivery from the hosting platform.
    pub fn webhook(event_type: &str, data: serde_json::Value) -> Self {
        Self {
            action: format!("whop_webhook_{}", event_type),
            user_id: None,
            resource_type: Some("webhook".to_string()),
            resource_id: None,
            metadata: data,
        }
    }
}

/// Query parameters for `GET /api/audit`.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
}
