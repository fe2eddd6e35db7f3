/**
 * Membership Webhook API
 *
 * POST /api/whop/webhook
 *
 * Receives membership lifecycle events from the hosting platform. Every
 * delivery is audited; membership events keep the user table in sync.
 * When a secret is configured the raw body must carry a hex HMAC-SHA256
 * signature in `x-whop-signature`.
 */

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::services::SqliteStore;
use crate::types::{MembershipData, NewAuditLog, UpsertUser, UserRole, WebhookAck, WebhookEvent};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-whop-signature";

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(receive))
}

/// POST /api/whop/webhook
async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    if let Some(secret) = state.config.webhook_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".to_string()))?;
        verify_signature(secret, &body, signature)?;
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    state
        .store
        .insert_audit_log(NewAuditLog::webhook(&event.event_type, event.data.clone()))?;

    apply_event(&state.store, &event)?;

    Ok(Json(WebhookAck { success: true }))
}

/// Check a hex HMAC-SHA256 of `body`. A `sha256=` prefix is accepted.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> Result<(), AppError> {
    let sig_hex = signature.trim();
    let sig_hex = sig_hex.strip_prefix("sha256=").unwrap_or(sig_hex);
    let expected = hex::decode(sig_hex)
        .map_err(|_| AppError::Unauthorized("Malformed webhook signature".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Webhook secret rejected: {}", e)))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| AppError::Unauthorized("Invalid webhook signature".to_string()))
}

/// Hex HMAC-SHA256 signature of a body, as the platform sends it.
pub fn sign(secret: &str, body: &[u8]) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Webhook secret rejected: {}", e)))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn apply_event(store: &SqliteStore, event: &WebhookEvent) -> Result<(), AppError> {
    match event.event_type.as_str() {
        "membership_created" | "membership_updated" => {
            let data = membership(event)?;
            let name = data
                .user
                .display_name()
                .unwrap_or_else(|| data.user_id.clone());
            let role = match data.product.role.as_deref() {
                Some("admin") => UserRole::Admin,
                _ => UserRole::Subscriber,
            };

            let user = store.upsert_user(UpsertUser {
                whop_user_id: data.user_id,
                name,
                email: data.user.email,
                role,
                product_id: data.product.id,
                membership_id: data.membership.id,
            })?;
            info!("Membership active for {} ({})", user.whop_user_id, user.role.as_str());
        }
        "membership_deleted" => {
            let data = membership(event)?;
            if store.set_membership_active(&data.user_id, false)? {
                info!("Membership ended for {}", data.user_id);
            } else {
                warn!("Membership deleted for unknown user {}", data.user_id);
            }
        }
        other => debug!("Ignoring webhook event {}", other),
    }
    Ok(())
}

fn membership(event: &WebhookEvent) -> Result<MembershipData, AppError> {
    serde_json::from_value(event.data.clone()).map_err(|e| {
        AppError::BadRequest(format!("Invalid {} payload: {}", event.event_type, e))
    })
}
