use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trading_signals::config::Config;
use trading_signals::services::{bootstrap_admins, SqliteStore};
use trading_signals::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trading_signals=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Starting trading signals server on {}:{}", config.host, config.port);

    // Open the database
    let store = match config.database_path.as_deref() {
        Some(path) => {
            info!("Using SQLite database at {}", path);
            SqliteStore::new(path)?
        }
        None => {
            warn!("DATABASE_PATH not set, data will not survive a restart");
            SqliteStore::new_in_memory()?
        }
    };
    let store = Arc::new(store);

    if !config.admin_whop_user_ids.is_empty() {
        let count = bootstrap_admins(&store, &config.admin_whop_user_ids)?;
        info!("Ensured {} bootstrap admins", count);
    }

    if config.webhook_secret.is_none() {
        warn!("WHOP_WEBHOOK_SECRET not set, webhook signatures are not checked");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, store);

    // Drop expired rate limit windows
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup();
        }
    });

    let app = build_router(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Trading signals server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
