//! Fixed-window request limiter keyed by caller identity.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Returned when a caller has used up the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Too many requests, retry in {}s", .retry_after.as_secs().max(1))]
pub struct RateLimitExceeded {
    pub retry_after: Duration,
}

struct Window {
    started: Instant,
    count: u32,
}

/// Per-key counter that resets once `window` has elapsed since the first hit.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: DashMap::new(),
        }
    }

    /// Count one request for `key`.
    pub fn check(&self, key: &str) -> Result<(), RateLimitExceeded> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), RateLimitExceeded> {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            return Err(RateLimitExceeded {
                retry_after: self.window.saturating_sub(elapsed),
            });
        }

        entry.count += 1;
        Ok(())
    }

    /// Drop windows that have already expired.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}
