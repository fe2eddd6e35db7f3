use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.signal_count() {
        Ok(_) => "ok",
        Err(e) => {
            warn!("Health check database probe failed: {}", e);
            "unavailable"
        }
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
