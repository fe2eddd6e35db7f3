//! Subscriber notification for a newly posted signal.

use serde::Serialize;

/// Placeholder the delivery layer substitutes per recipient.
pub const FIRST_NAME_PLACEHOLDER: &str = "{FirstName}";

/// A composed notification, not yet personalised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalNotification {
    /// Short title, e.g. "BUY · EURUSD"
    pub title: String,
    pub body: String,
}

impl SignalNotification {
    /// Body with the recipient's first name filled in.
    pub fn personalise(&self, first_name: &str) -> String {
        self.body.replace(FIRST_NAME_PLACEHOLDER, first_name)
    }
}
