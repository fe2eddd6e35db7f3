//! Subscriber notifications for newly posted signals.

use crate::services::validator::RATIO_PLACEHOLDER;
use crate::services::SqliteStore;
use crate::types::{Signal, SignalNotification, User, FIRST_NAME_PLACEHOLDER};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where composed notifications are delivered.
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification to the given recipients.
    fn deliver(&self, notification: &SignalNotification, recipients: &[User]);
}

/// Sink that writes deliveries to the tracing log.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, notification: &SignalNotification, recipients: &[User]) {
        info!(
            "Notifying {} active subscribers: {}",
            recipients.len(),
            notification.title
        );
        for user in recipients {
            debug!(
                "-> {}: {:?}",
                user.whop_user_id,
                notification.personalise(first_name(&user.name))
            );
        }
    }
}

/// Build the notification text for a stored signal.
pub fn compose(signal: &Signal) -> SignalNotification {
    let title = format!("{} · {}", signal.side, signal.instrument);

    let targets = signal
        .take_profits
        .iter()
        .enumerate()
        .map(|(i, tp)| format!("TP{}: {}", i + 1, tp.price))
        .collect::<Vec<_>>()
        .join(", ");

    let ratios = signal
        .take_profits
        .iter()
        .enumerate()
        .filter_map(|(i, tp)| tp.ratio.as_ref().map(|r| format!("TP{}: {}", i + 1, r)))
        .collect::<Vec<_>>()
        .join("; ");

    let mut body = format!(
        "Hi {},\n\nEntry: {} | SL: {} | TP(s): {}\nR/R: {}",
        FIRST_NAME_PLACEHOLDER,
        signal.entry,
        signal.stop_loss,
        non_empty(&targets),
        non_empty(&ratios),
    );
    if let Some(tag) = signal.risk_tag {
        body.push('\n');
        body.push_str(tag.as_str());
    }

    SignalNotification { title, body }
}

fn non_empty(s: &str) -> &str {
    if s.is_empty() {
        RATIO_PLACEHOLDER
    } else {
        s
    }
}

/// First word of a display name, or the whole name when it has none.
fn first_name(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or(name)
}

/// Composes and dispatches signal notifications to active subscribers.
pub struct Notifier {
    store: Arc<SqliteStore>,
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self::with_sink(store, Arc::new(LogSink))
    }

    pub fn with_sink(store: Arc<SqliteStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { store, sink }
    }

    /// Notify every active subscriber about a signal.
    ///
    /// Delivery failures never fail the submission; they are logged.
    pub fn dispatch(&self, signal: &Signal) -> SignalNotification {
        let notification = compose(signal);

        match self.store.active_subscribers() {
            Ok(recipients) => self.sink.deliver(&notification, &recipients),
            Err(e) => warn!("Failed to load subscribers for {}: {}", signal.id, e),
        }

        notification
    }
}
