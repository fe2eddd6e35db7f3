//! Audit log API (admin only).

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::auth::AdminOnly;
use crate::error::AppError;
use crate::types::{AuditLog, AuditQuery};
use crate::AppState;

/// Largest page the audit endpoint returns.
const MAX_AUDIT_LIMIT: i64 = 500;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_audit_logs))
}

/// GET /api/audit?limit=N
async fn get_audit_logs(
    State(state): State<AppState>,
    _auth: AdminOnly,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let Query(query) = query?;
    let limit = query
        .limit
        .filter(|&l| l > 0)
        .unwrap_or(state.config.audit_default_limit)
        .clamp(1, MAX_AUDIT_LIMIT);

    Ok(Json(state.store.get_audit_logs(limit)?))
}
