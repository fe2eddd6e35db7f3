use std::env;
use std::time::Duration;

/// Submission rate limit configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Signals one admin may post per window.
    pub max_requests: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_ms: 60_000,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// SQLite file path. In-memory database when unset.
    pub database_path: Option<String>,
    /// Shared secret for membership webhook signatures.
    pub webhook_secret: Option<String>,
    /// Platform user ids promoted to admin at startup.
    pub admin_whop_user_ids: Vec<String>,
    /// Signal submission limit.
    pub rate_limit: RateLimitConfig,
    /// Feed page size when the request names none.
    pub feed_default_limit: i64,
    /// Audit page size when the request names none.
    pub audit_default_limit: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let admin_whop_user_ids = non_empty("ADMIN_WHOP_USER_IDS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let defaults = RateLimitConfig::default();

        Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            database_path: non_empty("DATABASE_PATH"),
            webhook_secret: non_empty("WHOP_WEBHOOK_SECRET"),
            admin_whop_user_ids,
            rate_limit: RateLimitConfig {
                max_requests: lookup("SIGNAL_RATE_LIMIT_MAX")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_requests),
                window_ms: lookup("SIGNAL_RATE_LIMIT_WINDOW_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.window_ms),
            },
            feed_default_limit: lookup("FEED_DEFAULT_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            audit_default_limit: lookup("AUDIT_DEFAULT_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
