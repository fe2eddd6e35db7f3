pub mod audit;
pub mod notification;
pub mod signal;
pub mod user;
pub mod webhook;

pub use audit::*;
pub use notification::*;
pub use signal::*;
pub use user::*;
pub use webhook::*;

use chrono::{DateTime, Utc};

/// Current time truncated to the millisecond precision the store keeps.
pub fn utc_now_ms() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::<Utc>::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
