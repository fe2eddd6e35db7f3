use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{AccessError, RateLimitExceeded, SignalError};

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Build an error response with the standard body.
pub fn error_response(status: StatusCode, code: &'static str, message: String) -> Response {
    (status, Json(ErrorResponse { error: message, code })).into_response()
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code) = match self {
            AppError::Signal(e) => return e.into_response(),
            AppError::Access(e) => match e {
                AccessError::MissingIdentity | AccessError::UnknownUser(_) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
                }
                AccessError::MembershipInactive(_) => (StatusCode::FORBIDDEN, "MEMBERSHIP_INACTIVE"),
                AccessError::DatabaseError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
                }
            },
            AppError::RateLimited(e) => {
                let mut response =
                    error_response(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", message);
                let secs = e.retry_after.as_secs().max(1);
                if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                return response;
            }
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!("{}", message);
        }

        error_response(status, code, message)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_access_statuses() {
        let cases = [
            (AccessError::MissingIdentity, StatusCode::UNAUTHORIZED),
            (AccessError::UnknownUser("u".into()), StatusCode::UNAUTHORIZED),
            (AccessError::MembershipInactive("u".into()), StatusCode::FORBIDDEN),
            (AccessError::DatabaseError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::from(RateLimitExceeded {
            retry_after: Duration::from_secs(42),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn test_forbidden_status() {
        let response = AppError::Forbidden("admin only".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_bad_request_has_json_body() {
        let response = AppError::BadRequest("limit: invalid digit".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "BAD_REQUEST");
        assert_eq!(json["error"], "Bad request: limit: invalid digit");
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorResponse {
            error: "Forbidden: admin only".to_string(),
            code: "FORBIDDEN",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "FORBIDDEN");
        assert_eq!(json["error"], "Forbidden: admin only");
    }
}
