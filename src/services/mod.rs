pub mod access;
pub mod notifier;
pub mod rate_limit;
pub mod signals;
pub mod sqlite_store;
pub mod validator;

pub use access::{bootstrap_admins, AccessError, AccessVerifier, MembershipVerifier};
pub use notifier::{LogSink, NotificationSink, Notifier};
pub use rate_limit::{RateLimitExceeded, RateLimiter};
pub use signals::{SignalError, SignalService};
pub use sqlite_store::SqliteStore;
pub use validator::{
    compute_risk_reward, format_ratio, preview_ratios, validate, RiskRewardPreview, SignalDraft,
    ValidatedSignal, ValidationError,
};
