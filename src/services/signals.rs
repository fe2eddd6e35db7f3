//! Signal Service
//!
//! Submission pipeline and member-facing reads:
//! - Validate and annotate a submitted signal, then persist it
//! - Stamp the send time and audit the post in one write, then notify subscribers
//! - Feed paging with per-viewer read state
//! - Read receipts and per-user statistics

use crate::services::notifier::Notifier;
use crate::services::validator::{SignalDraft, ValidationError};
use crate::services::SqliteStore;
use crate::types::{
    utc_now_ms, CreateSignalRequest, FeedSignal, NewAuditLog, ReadEntry, Signal, SignalRead,
    SignalReadsResponse, User, UserStats,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Longest accepted instrument symbol, after trimming.
pub const MAX_INSTRUMENT_LEN: usize = 20;
/// Longest accepted notes text, in characters.
pub const MAX_NOTES_LEN: usize = 500;
/// Upper bound for one feed page.
pub const MAX_FEED_LIMIT: i64 = 100;

/// Signal service errors.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<rusqlite::Error> for SignalError {
    fn from(e: rusqlite::Error) -> Self {
        SignalError::DatabaseError(e.to_string())
    }
}

impl SignalError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SignalError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Signal posting and feed service.
#[derive(Clone)]
pub struct SignalService {
    store: Arc<SqliteStore>,
    notifier: Arc<Notifier>,
    feed_default_limit: i64,
}

impl SignalService {
    pub fn new(store: Arc<SqliteStore>, notifier: Arc<Notifier>) -> Self {
        Self {
            store,
            notifier,
            feed_default_limit: 20,
        }
    }

    /// Override the page size used when a feed request names none.
    pub fn with_feed_default_limit(mut self, limit: i64) -> Self {
        self.feed_default_limit = limit.clamp(1, MAX_FEED_LIMIT);
        self
    }

    /// Validate, store and broadcast a new signal.
    ///
    /// The signal row and its audit entry are written together.
    pub fn create_signal(
        &self,
        author: &User,
        request: &CreateSignalRequest,
    ) -> Result<Signal, SignalError> {
        let instrument = check_instrument(&request.instrument)?;
        let notes = check_notes(request.notes.as_deref())?;
        let trading_view_link = check_link(request.trading_view_link.as_deref())?;

        let validated = SignalDraft::from(request).validate()?;

        let now = utc_now_ms();
        let signal = Signal {
            id: Uuid::new_v4().to_string(),
            side: validated.direction,
            instrument,
            entry: validated.entry.raw().to_string(),
            stop_loss: validated.stop_loss.raw().to_string(),
            take_profits: validated.take_profit_levels(),
            risk_tag: request.risk_tag,
            trading_view_link,
            notes,
            created_by: author.id.clone(),
            created_at: now,
            sent_at: Some(now),
        };

        self.store.publish_signal(
            &signal,
            NewAuditLog::signal(
                "signal_created",
                &author.id,
                &signal.id,
                json!({ "instrument": signal.instrument, "side": signal.side }),
            ),
        )?;

        info!(
            "Signal {} posted: {} {} by {}",
            signal.id, signal.side, signal.instrument, author.whop_user_id
        );

        self.notifier.dispatch(&signal);
        Ok(signal)
    }

    /// Newest-first feed page with the viewer's read state.
    ///
    /// A missing or non-positive limit means the default page size.
    pub fn feed(
        &self,
        viewer: &User,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<FeedSignal>, SignalError> {
        let limit = limit
            .filter(|&l| l > 0)
            .unwrap_or(self.feed_default_limit)
            .min(MAX_FEED_LIMIT);
        let offset = offset.unwrap_or(0).max(0);

        let page = self.store.list_signals(&viewer.id, limit, offset)?;
        debug!("Feed for {}: {} signals (offset {})", viewer.whop_user_id, page.len(), offset);
        Ok(page)
    }

    pub fn get_signal(&self, signal_id: &str) -> Result<Signal, SignalError> {
        self.store
            .get_signal(signal_id)?
            .ok_or_else(|| SignalError::SignalNotFound(signal_id.to_string()))
    }

    /// Record a read receipt. Repeated reads return the first receipt.
    pub fn mark_read(&self, signal_id: &str, reader: &User) -> Result<SignalRead, SignalError> {
        self.get_signal(signal_id)?;

        let read = self.store.mark_signal_read(signal_id, &reader.id)?;
        self.store.insert_audit_log(NewAuditLog::signal(
            "signal_read",
            &reader.id,
            signal_id,
            json!({}),
        ))?;

        debug!("Signal {} read by {}", signal_id, reader.whop_user_id);
        Ok(read)
    }

    /// Who has read a signal, most recent first.
    pub fn reads(&self, signal_id: &str) -> Result<SignalReadsResponse, SignalError> {
        self.get_signal(signal_id)?;

        let reads: Vec<ReadEntry> = self
            .store
            .get_signal_reads(signal_id)?
            .into_iter()
            .map(|r| ReadEntry {
                user_id: r.user_id,
                read_at: r.read_at,
            })
            .collect();

        Ok(SignalReadsResponse {
            count: reads.len(),
            reads,
        })
    }

    /// Feed statistics for one member.
    pub fn user_stats(&self, user: &User) -> Result<UserStats, SignalError> {
        let total_signals = self.store.signal_count()?;
        let read_signals = self.store.user_read_count(&user.id)?;

        let first_ratios: Vec<Decimal> = self
            .store
            .all_take_profits()?
            .into_iter()
            .filter_map(|levels| levels.into_iter().next())
            .filter_map(|tp| tp.ratio)
            .filter_map(|ratio| parse_ratio(&ratio))
            .collect();

        Ok(UserStats {
            total_signals,
            read_signals,
            avg_rr: mean_ratio(&first_ratios),
        })
    }
}

fn check_instrument(raw: &str) -> Result<String, SignalError> {
    let instrument = raw.trim();
    if instrument.is_empty() {
        return Err(SignalError::invalid("instrument", "must not be empty"));
    }
    if instrument.chars().count() > MAX_INSTRUMENT_LEN {
        return Err(SignalError::invalid(
            "instrument",
            format!("at most {} characters", MAX_INSTRUMENT_LEN),
        ));
    }
    Ok(instrument.to_string())
}

fn check_notes(raw: Option<&str>) -> Result<Option<String>, SignalError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(notes) if notes.chars().count() > MAX_NOTES_LEN => Err(SignalError::invalid(
            "notes",
            format!("at most {} characters", MAX_NOTES_LEN),
        )),
        Some(notes) => Ok(Some(notes.to_string())),
    }
}

fn check_link(raw: Option<&str>) -> Result<Option<String>, SignalError> {
    let link = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(link) => link,
    };

    let url = Url::parse(link)
        .map_err(|e| SignalError::invalid("tradingViewLink", e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SignalError::invalid(
            "tradingViewLink",
            "must be an http(s) URL",
        ));
    }
    Ok(Some(link.to_string()))
}

/// "2.4R" -> 2.4
fn parse_ratio(ratio: &str) -> Option<Decimal> {
    match Decimal::from_str(ratio.trim().trim_end_matches('R')) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Skipping unreadable ratio {:?}: {}", ratio, e);
            None
        }
    }
}

fn mean_ratio(ratios: &[Decimal]) -> f64 {
    if ratios.is_empty() {
        return 0.0;
    }
    let sum: Decimal = ratios.iter().copied().sum();
    (sum / Decimal::from(ratios.len()))
        .round_dp(2)
        .to_f64()
        .unwrap_or(0.0)
}
