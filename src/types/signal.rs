//! Signal types shared by the validator, the store and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional type of a posted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    Buy,
    Sell,
    BuyLimit,
    SellLimit,
}

impl SignalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::Buy => "BUY",
            SignalDirection::Sell => "SELL",
            SignalDirection::BuyLimit => "BUY_LIMIT",
            SignalDirection::SellLimit => "SELL_LIMIT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(SignalDirection::Buy),
            "SELL" => Some(SignalDirection::Sell),
            "BUY_LIMIT" => Some(SignalDirection::BuyLimit),
            "SELL_LIMIT" => Some(SignalDirection::SellLimit),
            _ => None,
        }
    }

    /// Long signals profit as price rises. Limit and market orders share a side.
    pub fn is_long(&self) -> bool {
        matches!(self, SignalDirection::Buy | SignalDirection::BuyLimit)
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk label an admin may attach to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTag {
    Safe,
    Normal,
    Risky,
}

impl RiskTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTag::Safe => "SAFE",
            RiskTag::Normal => "NORMAL",
            RiskTag::Risky => "RISKY",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SAFE" => Some(RiskTag::Safe),
            "NORMAL" => Some(RiskTag::Normal),
            "RISKY" => Some(RiskTag::Risky),
            _ => None,
        }
    }
}

impl fmt::Display for RiskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A take-profit level as stored on a signal.
///
/// `price` keeps the exact string the admin entered. `ratio` is always
/// derived server-side (e.g. `"2.4R"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeProfitLevel {
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<String>,
}

/// A persisted, immutable signal post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: String,
    pub side: SignalDirection,
    pub instrument: String,
    pub entry: String,
    pub stop_loss: String,
    pub take_profits: Vec<TakeProfitLevel>,
    pub risk_tag: Option<RiskTag>,
    pub trading_view_link: Option<String>,
    pub notes: Option<String>,
    /// Internal user id of the author
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Price field as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeProfitInput {
    pub price: String,
}

/// Body of `POST /api/signals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSignalRequest {
    pub side: SignalDirection,
    pub instrument: String,
    pub entry: String,
    pub stop_loss: String,
    #[serde(default)]
    pub take_profits: Vec<TakeProfitInput>,
    #[serde(default)]
    pub risk_tag: Option<RiskTag>,
    #[serde(default)]
    pub trading_view_link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `POST /api/signals/preview`. Every field may still be half-typed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub side: SignalDirection,
    #[serde(default)]
    pub entry: String,
    #[serde(default)]
    pub stop_loss: String,
    #[serde(default)]
    pub take_profits: Vec<TakeProfitInput>,
}

/// A feed entry: the signal plus the viewer's read state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSignal {
    #[serde(flatten)]
    pub signal: Signal,
    pub read_count: i64,
    pub is_read: bool,
}

/// Query parameters for the feed.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One user's read of a signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRead {
    pub id: String,
    pub signal_id: String,
    pub user_id: String,
    pub read_at: DateTime<Utc>,
}

/// Read entry as exposed to admins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadEntry {
    pub user_id: String,
    pub read_at: DateTime<Utc>,
}

/// Response of `GET /api/signals/:id/reads`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReadsResponse {
    pub count: usize,
    pub reads: Vec<ReadEntry>,
}

/// Per-user feed statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_signals: i64,
    pub read_signals: i64,
    /// Mean first-target R multiple across posted signals
    #[serde(rename = "avgRR")]
    pub avg_rr: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_wire_names() {
        let json = serde_json::to_string(&SignalDirection::BuyLimit).unwrap();
        assert_eq!(json, "\"BUY_LIMIT\"");

        let parsed: SignalDirection = serde_json::from_str("\"SELL_LIMIT\"").unwrap();
        assert_eq!(parsed, SignalDirection::SellLimit);
        assert!(serde_json::from_str::<SignalDirection>("\"buy\"").is_err());
    }

    #[test]
    fn test_direction_from_str_matches_as_str() {
        for d in [
            SignalDirection::Buy,
            SignalDirection::Sell,
            SignalDirection::BuyLimit,
            SignalDirection::SellLimit,
        ] {
            assert_eq!(SignalDirection::from_str(d.as_str()), Some(d));
        }
        assert_eq!(SignalDirection::from_str("HOLD"), None);
    }

    #[test]
    fn test_direction_is_long() {
        assert!(SignalDirection::Buy.is_long());
        assert!(SignalDirection::BuyLimit.is_long());
        assert!(!SignalDirection::Sell.is_long());
        assert!(!SignalDirection::SellLimit.is_long());
    }

    #[test]
    fn test_risk_tag_serialization() {
        assert_eq!(serde_json::to_string(&RiskTag::Risky).unwrap(), "\"RISKY\"");
        let tag: RiskTag = serde_json::from_str("\"SAFE\"").unwrap();
        assert_eq!(tag, RiskTag::Safe);
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateSignalRequest = serde_json::from_str(
            r#"{"side":"BUY","instrument":"EURUSD","entry":"1.0845","stopLoss":"1.0820"}"#,
        )
        .unwrap();

        assert!(request.take_profits.is_empty());
        assert!(request.risk_tag.is_none());
        assert!(request.notes.is_none());
    }

    #[test]
    fn test_user_stats_field_names() {
        let stats = UserStats {
            total_signals: 4,
            read_signals: 2,
            avg_rr: 1.5,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalSignals"], 4);
        assert_eq!(json["avgRR"], 1.5);
    }

    #[test]
    fn test_take_profit_without_ratio_omits_field() {
        let level = TakeProfitLevel {
            price: "1.1".to_string(),
            ratio: None,
        };
        let json = serde_json::to_string(&level).unwrap();
        assert_eq!(json, r#"{"price":"1.1"}"#);
    }
}
