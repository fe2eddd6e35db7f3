//! Trading Signals - members-only trade signal feed with risk/reward validation

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

use axum::Router;
use config::Config;
use services::{AccessVerifier, MembershipVerifier, Notifier, RateLimiter, SignalService, SqliteStore};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SqliteStore>,
    pub signal_service: Arc<SignalService>,
    pub access: Arc<dyn AccessVerifier>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wire services over an opened store.
    pub fn new(config: Config, store: Arc<SqliteStore>) -> Self {
        let notifier = Arc::new(Notifier::new(store.clone()));
        Self::with_notifier(config, store, notifier)
    }

    pub fn with_notifier(config: Config, store: Arc<SqliteStore>, notifier: Arc<Notifier>) -> Self {
        let signal_service = SignalService::new(store.clone(), notifier)
            .with_feed_default_limit(config.feed_default_limit);
        let rate_limiter = RateLimiter::new(
            config.rate_limit.max_requests,
            config.rate_limit.window(),
        );

        Self {
            access: Arc::new(MembershipVerifier::new(store.clone())),
            signal_service: Arc::new(signal_service),
            rate_limiter: Arc::new(rate_limiter),
            store,
            config: Arc::new(config),
        }
    }
}

/// Full HTTP application: API routes plus CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
