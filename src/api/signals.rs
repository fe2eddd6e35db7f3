/**
 * Signals API
 *
 * Endpoints:
 * - GET  /api/signals            feed (member)
 * - POST /api/signals            post a signal (admin, rate limited)
 * - POST /api/signals/preview    live risk/reward preview (member)
 * - POST /api/signals/:id/read   mark read (member)
 * - GET  /api/signals/:id/reads  read receipts (admin)
 */

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::auth::{AdminOnly, Authenticated};
use crate::error::{error_response, AppError};
use crate::services::{RiskRewardPreview, SignalError};
use crate::types::{
    CreateSignalRequest, FeedQuery, FeedSignal, PreviewRequest, Signal, SignalRead,
    SignalReadsResponse,
};
use crate::AppState;

/// Convert SignalError to HTTP response.
impl IntoResponse for SignalError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            SignalError::Validation(e) => (StatusCode::BAD_REQUEST, e.code()),
            SignalError::InvalidField { .. } => (StatusCode::BAD_REQUEST, "INVALID_FIELD"),
            SignalError::SignalNotFound(_) => (StatusCode::NOT_FOUND, "SIGNAL_NOT_FOUND"),
            SignalError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        };

        if status.is_server_error() {
            tracing::error!("Signal request failed: {}", self);
        }

        error_response(status, code, self.to_string())
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_feed).post(create_signal))
        .route("/preview", post(preview))
        .route("/:id/read", post(mark_read))
        .route("/:id/reads", get(get_reads))
}

/// GET /api/signals
async fn get_feed(
    State(state): State<AppState>,
    auth: Authenticated,
    query: Result<Query<FeedQuery>, QueryRejection>,
) -> Result<Json<Vec<FeedSignal>>, AppError> {
    let Query(query) = query?;
    let feed = state
        .signal_service
        .feed(&auth.user.user, query.limit, query.offset)?;
    Ok(Json(feed))
}

/// POST /api/signals
///
/// Rate limited per admin before the body is read.
async fn create_signal(
    State(state): State<AppState>,
    auth: AdminOnly,
    payload: Result<Json<CreateSignalRequest>, JsonRejection>,
) -> Result<Json<Signal>, AppError> {
    state.rate_limiter.check(&auth.user.user.whop_user_id)?;

    let Json(request) = payload?;
    let signal = state
        .signal_service
        .create_signal(&auth.user.user, &request)?;

    Ok(Json(signal))
}

/// POST /api/signals/preview
async fn preview(
    _auth: Authenticated,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<RiskRewardPreview>, AppError> {
    let Json(request) = payload?;
    Ok(Json(RiskRewardPreview::from(&request)))
}

/// POST /api/signals/:id/read
async fn mark_read(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SignalRead>, AppError> {
    let read = state.signal_service.mark_read(&id, &auth.user.user)?;
    Ok(Json(read))
}

/// GET /api/signals/:id/reads
async fn get_reads(
    State(state): State<AppState>,
    _auth: AdminOnly,
    Path(id): Path<String>,
) -> Result<Json<SignalReadsResponse>, AppError> {
    Ok(Json(state.signal_service.reads(&id)?))
}
