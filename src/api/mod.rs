pub mod audit;
pub mod auth;
pub mod health;
pub mod signals;
pub mod user;
pub mod webhook;

use crate::AppState;
use axum::Router;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/signals", signals::router())
        .nest("/api/user", user::router())
        .nest("/api/audit", audit::router())
        .nest("/api/whop", webhook::router())
}
