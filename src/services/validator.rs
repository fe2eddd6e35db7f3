//! Signal price-level validation and risk/reward derivation.
//!
//! Checks run in a fixed order and stop at the first violation:
//!
//! 1. take-profit count (at most [`MAX_TAKE_PROFITS`])
//! 2. price format and range: entry, stop loss, then each take profit in input order
//! 3. entry must differ from stop loss
//! 4. stop loss on the losing side of entry
//! 5. each take profit on the winning side of entry, in input order
//!
//! Prices are carried as [`Decimal`] so that 5-decimal FX quotes compare and
//! subtract exactly. The caller's original strings are kept for storage.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::types::{CreateSignalRequest, PreviewRequest, SignalDirection, TakeProfitLevel};

/// Maximum number of take-profit levels on one signal.
pub const MAX_TAKE_PROFITS: usize = 5;

/// Decimal places used when a price is shown to a person.
pub const PRICE_DISPLAY_DECIMALS: u32 = 5;

/// Most significant digits a price may carry and still be held exactly.
pub const MAX_PRICE_DIGITS: usize = 28;

/// Shown wherever a ratio or level is not available.
pub const RATIO_PLACEHOLDER: &str = "–";

/// Which price of a draft a problem refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Entry,
    StopLoss,
    /// Zero-based position in the take-profit list
    TakeProfit(usize),
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceField::Entry => write!(f, "entry"),
            PriceField::StopLoss => write!(f, "stop loss"),
            PriceField::TakeProfit(index) => write!(f, "take profit {}", index + 1),
        }
    }
}

/// Reasons a draft is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid {field} price format: {value:?}")]
    MalformedPrice { field: PriceField, value: String },

    #[error("{field} price is beyond the supported precision or range")]
    PriceOutOfRange { field: PriceField },

    #[error("Too many take profit levels: {count} (max {})", MAX_TAKE_PROFITS)]
    TooManyTakeProfits { count: usize },

    #[error("Entry and stop loss cannot be the same price")]
    EntryEqualsStop,

    #[error("Stop loss is on the wrong side of entry for a {direction} signal")]
    InvalidStopDirection { direction: SignalDirection },

    #[error("Take profit {} is on the wrong side of entry for a {direction} signal", .index + 1)]
    InvalidTakeProfitDirection {
        /// Zero-based position in the take-profit list
        index: usize,
        direction: SignalDirection,
    },
}

impl ValidationError {
    /// Stable machine-readable kind.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MalformedPrice { .. } => "MALFORMED_PRICE",
            ValidationError::PriceOutOfRange { .. } => "PRICE_OUT_OF_RANGE",
            ValidationError::TooManyTakeProfits { .. } => "TOO_MANY_TAKE_PROFITS",
            ValidationError::EntryEqualsStop => "ENTRY_EQUALS_STOP",
            ValidationError::InvalidStopDirection { .. } => "INVALID_STOP_DIRECTION",
            ValidationError::InvalidTakeProfitDirection { .. } => "INVALID_TAKE_PROFIT_DIRECTION",
        }
    }
}

/// Input of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDraft {
    pub direction: SignalDirection,
    pub entry: String,
    pub stop_loss: String,
    pub take_profits: Vec<String>,
}

impl SignalDraft {
    pub fn new(
        direction: SignalDirection,
        entry: impl Into<String>,
        stop_loss: impl Into<String>,
        take_profits: Vec<String>,
    ) -> Self {
        Self {
            direction,
            entry: entry.into(),
            stop_loss: stop_loss.into(),
            take_profits,
        }
    }

    pub fn validate(&self) -> Result<ValidatedSignal, ValidationError> {
        validate(self)
    }
}

impl From<&CreateSignalRequest> for SignalDraft {
    fn from(request: &CreateSignalRequest) -> Self {
        Self {
            direction: request.side,
            entry: request.entry.clone(),
            stop_loss: request.stop_loss.clone(),
            take_profits: request.take_profits.iter().map(|tp| tp.price.clone()).collect(),
        }
    }
}

/// A parsed price together with the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevel {
    raw: String,
    value: Decimal,
}

impl PriceLevel {
    /// Parse a price; `None` when the text is not a plain non-negative decimal.
    pub fn parse(raw: &str) -> Option<Self> {
        parse_price(raw).map(|value| Self {
            raw: raw.to_string(),
            value,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Fixed 5-decimal rendering for display.
    pub fn display(&self) -> String {
        format_price(self.value)
    }
}

/// A take profit that passed validation, with its derived R multiple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTakeProfit {
    pub price: PriceLevel,
    pub ratio: Decimal,
}

/// A draft that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSignal {
    pub direction: SignalDirection,
    pub entry: PriceLevel,
    pub stop_loss: PriceLevel,
    pub take_profits: Vec<ValidatedTakeProfit>,
}

impl ValidatedSignal {
    pub fn is_long(&self) -> bool {
        self.direction.is_long()
    }

    /// Distance between entry and stop loss. Never zero.
    pub fn risk(&self) -> Decimal {
        (self.entry.value - self.stop_loss.value).abs()
    }

    /// Take profits in input order, annotated with ratio strings, ready to store.
    pub fn take_profit_levels(&self) -> Vec<TakeProfitLevel> {
        self.take_profits
            .iter()
            .map(|tp| TakeProfitLevel {
                price: tp.price.raw.clone(),
                ratio: Some(format_ratio(tp.ratio)),
            })
            .collect()
    }
}

/// Validate a draft and derive the R multiple of every take profit.
pub fn validate(draft: &SignalDraft) -> Result<ValidatedSignal, ValidationError> {
    if draft.take_profits.len() > MAX_TAKE_PROFITS {
        return Err(ValidationError::TooManyTakeProfits {
            count: draft.take_profits.len(),
        });
    }

    let entry = parse_field(&draft.entry, PriceField::Entry)?;
    let stop_loss = parse_field(&draft.stop_loss, PriceField::StopLoss)?;
    let targets = draft
        .take_profits
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_field(raw, PriceField::TakeProfit(index)))
        .collect::<Result<Vec<_>, _>>()?;

    if entry.value == stop_loss.value {
        return Err(ValidationError::EntryEqualsStop);
    }

    let is_long = draft.direction.is_long();
    let stop_ok = if is_long {
        stop_loss.value < entry.value
    } else {
        stop_loss.value > entry.value
    };
    if !stop_ok {
        return Err(ValidationError::InvalidStopDirection {
            direction: draft.direction,
        });
    }

    let mut take_profits = Vec::with_capacity(targets.len());
    for (index, price) in targets.into_iter().enumerate() {
        let target_ok = if is_long {
            price.value > entry.value
        } else {
            price.value < entry.value
        };
        if !target_ok {
            return Err(ValidationError::InvalidTakeProfitDirection {
                index,
                direction: draft.direction,
            });
        }

        // Entry and stop already differ, so `None` here means the quotient overflowed.
        let ratio = compute_risk_reward(entry.value, stop_loss.value, price.value, is_long)
            .ok_or(ValidationError::PriceOutOfRange {
                field: PriceField::TakeProfit(index),
            })?;
        take_profits.push(ValidatedTakeProfit { price, ratio });
    }

    Ok(ValidatedSignal {
        direction: draft.direction,
        entry,
        stop_loss,
        take_profits,
    })
}

/// Reward distance over risk distance.
///
/// Does not check directionality: a target on the losing side gives a
/// negative multiple. Returns `None` when entry equals stop loss, where the
/// ratio is undefined, or when the arithmetic leaves the `Decimal` range.
pub fn compute_risk_reward(
    entry: Decimal,
    stop_loss: Decimal,
    take_profit: Decimal,
    is_long: bool,
) -> Option<Decimal> {
    let risk = entry.checked_sub(stop_loss)?.abs();
    if risk.is_zero() {
        return None;
    }

    let reward = if is_long {
        take_profit.checked_sub(entry)?
    } else {
        entry.checked_sub(take_profit)?
    };

    reward.checked_div(risk)
}

/// Render an R multiple with one decimal, e.g. `2.4R`.
pub fn format_ratio(ratio: Decimal) -> String {
    let mut rounded = ratio.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(1);
    format!("{}R", rounded)
}

/// Render a price with [`PRICE_DISPLAY_DECIMALS`] decimals.
pub fn format_price(price: Decimal) -> String {
    let mut rounded =
        price.round_dp_with_strategy(PRICE_DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(PRICE_DISPLAY_DECIMALS);
    rounded.to_string()
}

/// Parse a price of the form `digits[.digits]`.
///
/// No sign, exponent, separators or surrounding whitespace. A trailing
/// decimal point (`"12."`) is accepted. Prices with more than
/// [`MAX_PRICE_DIGITS`] significant or fractional digits are refused rather
/// than rounded.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    read_price(raw).ok()
}

enum PriceProblem {
    Malformed,
    OutOfRange,
}

fn read_price(raw: &str) -> Result<Decimal, PriceProblem> {
    let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw, ""));

    if int_part.is_empty()
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(PriceProblem::Malformed);
    }

    let significant = int_part.trim_start_matches('0').len() + frac_part.len();
    if frac_part.len() > MAX_PRICE_DIGITS || significant > MAX_PRICE_DIGITS {
        return Err(PriceProblem::OutOfRange);
    }

    let text = if frac_part.is_empty() { int_part } else { raw };
    Decimal::from_str(text).map_err(|_| PriceProblem::OutOfRange)
}

fn parse_field(raw: &str, field: PriceField) -> Result<PriceLevel, ValidationError> {
    match read_price(raw) {
        Ok(value) => Ok(PriceLevel {
            raw: raw.to_string(),
            value,
        }),
        Err(PriceProblem::Malformed) => Err(ValidationError::MalformedPrice {
            field,
            value: raw.to_string(),
        }),
        Err(PriceProblem::OutOfRange) => Err(ValidationError::PriceOutOfRange { field }),
    }
}

/// Ratios for a form that is still being edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRewardPreview {
    /// Entry to stop distance, when both parse and differ
    pub risk: Option<String>,
    /// One entry per take profit; `None` where no ratio can be shown
    pub ratios: Vec<Option<String>>,
}

impl RiskRewardPreview {
    /// Ratios with the placeholder substituted for missing values.
    pub fn display_ratios(&self) -> Vec<String> {
        self.ratios
            .iter()
            .map(|r| r.clone().unwrap_or_else(|| RATIO_PLACEHOLDER.to_string()))
            .collect()
    }
}

/// Best-effort ratios for live editing. Never fails.
///
/// Unparseable numbers and zero risk yield `None` for the affected entries.
pub fn preview_ratios(
    direction: SignalDirection,
    entry: &str,
    stop_loss: &str,
    take_profits: &[String],
) -> RiskRewardPreview {
    let entry = parse_price(entry.trim());
    let stop_loss = parse_price(stop_loss.trim());

    let risk = match (entry, stop_loss) {
        (Some(e), Some(s)) if e != s => Some(format_price((e - s).abs())),
        _ => None,
    };

    let ratios = take_profits
        .iter()
        .map(|tp| {
            let (e, s) = (entry?, stop_loss?);
            let t = parse_price(tp.trim())?;
            compute_risk_reward(e, s, t, direction.is_long()).map(format_ratio)
        })
        .collect();

    RiskRewardPreview { risk, ratios }
}

impl From<&PreviewRequest> for RiskRewardPreview {
    fn from(request: &PreviewRequest) -> Self {
        let take_profits: Vec<String> =
            request.take_profits.iter().map(|tp| tp.price.clone()).collect();
        preview_ratios(request.side, &request.entry, &request.stop_loss, &take_profits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft(direction: SignalDirection, entry: &str, stop: &str, tps: &[&str]) -> SignalDraft {
        SignalDraft::new(
            direction,
            entry,
            stop,
            tps.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn ratios(signal: &ValidatedSignal) -> Vec<String> {
        signal
            .take_profit_levels()
            .into_iter()
            .filter_map(|tp| tp.ratio)
            .collect()
    }

    // =========================================================================
    // Reference scenarios
    // =========================================================================

    #[test]
    fn test_long_signal_one_to_one() {
        let signal = validate(&draft(SignalDirection::Buy, "1.08450", "1.08200", &["1.08700"]))
            .unwrap();

        assert_eq!(signal.risk(), dec!(0.00250));
        assert_eq!(signal.take_profits[0].ratio, dec!(1));
        assert_eq!(ratios(&signal), vec!["1.0R"]);
    }

    #[test]
    fn test_long_with_stop_above_entry() {
        let err = validate(&draft(SignalDirection::Buy, "1.08450", "1.08700", &["1.09000"]))
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::InvalidStopDirection {
                direction: SignalDirection::Buy
            }
        );
        assert_eq!(err.code(), "INVALID_STOP_DIRECTION");
    }

    #[test]
    fn test_entry_equals_stop() {
        let err = validate(&draft(SignalDirection::Sell, "1.2000", "1.2000", &[])).unwrap_err();
        assert_eq!(err, ValidationError::EntryEqualsStop);
    }

    #[test]
    fn test_entry_equals_stop_with_different_spelling() {
        let err = validate(&draft(SignalDirection::Sell, "1.2", "1.20000", &[])).unwrap_err();
        assert_eq!(err, ValidationError::EntryEqualsStop);
    }

    #[test]
    fn test_short_limit_two_targets() {
        let signal = validate(&draft(
            SignalDirection::SellLimit,
            "1.3000",
            "1.3050",
            &["1.2950", "1.2900"],
        ))
        .unwrap();

        assert_eq!(ratios(&signal), vec!["1.0R", "2.0R"]);
    }

    #[test]
    fn test_six_take_profits_rejected() {
        let err = validate(&draft(
            SignalDirection::Buy,
            "1.1000",
            "1.0950",
            &["1.1010", "1.1020", "1.1030", "1.1040", "1.1050", "1.1060"],
        ))
        .unwrap_err();

        assert_eq!(err, ValidationError::TooManyTakeProfits { count: 6 });
    }

    #[test]
    fn test_five_take_profits_accepted() {
        let signal = validate(&draft(
            SignalDirection::Buy,
            "1.1000",
            "1.0950",
            &["1.1010", "1.1020", "1.1030", "1.1040", "1.1050"],
        ))
        .unwrap();

        assert_eq!(ratios(&signal), vec!["0.2R", "0.4R", "0.6R", "0.8R", "1.0R"]);
    }

    // =========================================================================
    // Direction rules
    // =========================================================================

    #[test]
    fn test_empty_take_profits_valid_both_sides() {
        assert!(validate(&draft(SignalDirection::Buy, "100", "95", &[])).is_ok());
        assert!(validate(&draft(SignalDirection::SellLimit, "100", "105", &[])).is_ok());
    }

    #[test]
    fn test_stop_direction_checked_without_targets() {
        let err = validate(&draft(SignalDirection::BuyLimit, "100", "105", &[])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidStopDirection { .. }));

        let err = validate(&draft(SignalDirection::Sell, "100", "95", &[])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidStopDirection { .. }));
    }

    #[test]
    fn test_take_profit_at_entry_rejected() {
        let err = validate(&draft(SignalDirection::Buy, "100", "95", &["110", "100"])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidTakeProfitDirection {
                index: 1,
                direction: SignalDirection::Buy
            }
        );
    }

    #[test]
    fn test_short_take_profit_above_entry_rejected() {
        let err = validate(&draft(SignalDirection::Sell, "100", "105", &["101"])).unwrap_err();
        assert_eq!(err.code(), "INVALID_TAKE_PROFIT_DIRECTION");
        assert!(err.to_string().contains("Take profit 1"));
    }

    #[test]
    fn test_limit_variants_follow_market_rules() {
        let long = |d| validate(&draft(d, "50", "40", &["70"]));
        assert!(long(SignalDirection::Buy).is_ok());
        assert!(long(SignalDirection::BuyLimit).is_ok());
        assert!(long(SignalDirection::Sell).is_err());
        assert!(long(SignalDirection::SellLimit).is_err());
    }

    #[test]
    fn test_acceptance_matches_price_rules() {
        let levels = ["90", "95", "100", "105", "110"];
        let directions = [
            SignalDirection::Buy,
            SignalDirection::Sell,
            SignalDirection::BuyLimit,
            SignalDirection::SellLimit,
        ];

        for direction in directions {
            for stop in levels {
                for tp in levels {
                    let e = dec!(100);
                    let s = Decimal::from_str(stop).unwrap();
                    let t = Decimal::from_str(tp).unwrap();
                    let expected = if direction.is_long() {
                        s < e && t > e
                    } else {
                        s > e && t < e
                    };

                    let outcome = validate(&draft(direction, "100", stop, &[tp]));
                    assert_eq!(
                        outcome.is_ok(),
                        expected,
                        "{direction} entry=100 stop={stop} tp={tp}"
                    );
                }
            }
        }
    }

    // =========================================================================
    // Check ordering
    // =========================================================================

    #[test]
    fn test_count_checked_before_format() {
        let err = validate(&draft(
            SignalDirection::Buy,
            "abc",
            "1",
            &["1", "2", "3", "4", "5", "6"],
        ))
        .unwrap_err();
        assert!(matches!(err, ValidationError::TooManyTakeProfits { .. }));
    }

    #[test]
    fn test_format_checked_before_price_rules() {
        let err = validate(&draft(SignalDirection::Buy, "100", "100", &["x"])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MalformedPrice {
                field: PriceField::TakeProfit(0),
                value: "x".to_string()
            }
        );
    }

    #[test]
    fn test_equal_prices_reported_before_target_side() {
        let err = validate(&draft(SignalDirection::Buy, "100", "100", &["90"])).unwrap_err();
        assert_eq!(err, ValidationError::EntryEqualsStop);
    }

    #[test]
    fn test_stop_side_reported_before_target_side() {
        let err = validate(&draft(SignalDirection::Sell, "100", "90", &["110"])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidStopDirection { .. }));
    }

    #[test]
    fn test_first_bad_target_reported() {
        let err = validate(&draft(SignalDirection::Buy, "100", "90", &["120", "80", "70"]))
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidTakeProfitDirection { index: 1, .. }
        ));
    }

    // =========================================================================
    // Price parsing
    // =========================================================================

    #[test]
    fn test_parse_price_accepts_plain_decimals() {
        assert_eq!(parse_price("1.08450"), Some(dec!(1.08450)));
        assert_eq!(parse_price("42"), Some(dec!(42)));
        assert_eq!(parse_price("12."), Some(dec!(12)));
        assert_eq!(parse_price("0.0"), Some(dec!(0)));
        assert_eq!(parse_price("007.5"), Some(dec!(7.5)));
    }

    #[test]
    fn test_parse_price_rejects_other_forms() {
        for raw in [
            "", ".5", "-1.0", "+1", "1e5", "1,000", " 1.0", "1.0 ", "1.2.3", "abc", "0x10", "NaN",
        ] {
            assert_eq!(parse_price(raw), None, "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_malformed_entry_and_stop() {
        let err = validate(&draft(SignalDirection::Buy, "1,08", "1.07", &[])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MalformedPrice {
                field: PriceField::Entry,
                value: "1,08".to_string()
            }
        );

        let err = validate(&draft(SignalDirection::Buy, "1.08", "-1", &[])).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MalformedPrice {
                field: PriceField::StopLoss,
                ..
            }
        ));
        assert_eq!(err.code(), "MALFORMED_PRICE");
        assert!(err.to_string().contains("stop loss"));
    }

    #[test]
    fn test_excess_precision_is_out_of_range() {
        // 29 fractional digits would round onto the stop loss
        let err = validate(&draft(
            SignalDirection::Buy,
            "1.00000000000000000000000000001",
            "1",
            &[],
        ))
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::PriceOutOfRange {
                field: PriceField::Entry
            }
        );
        assert_eq!(err.code(), "PRICE_OUT_OF_RANGE");
    }

    #[test]
    fn test_price_beyond_decimal_capacity_is_out_of_range() {
        let err = validate(&draft(
            SignalDirection::Buy,
            "0.0000000000000000000000000002",
            "0.0000000000000000000000000001",
            &["79228162514264337593543950335"],
        ))
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::PriceOutOfRange {
                field: PriceField::TakeProfit(0)
            }
        );
        assert_eq!(parse_price("79228162514264337593543950335"), None);
    }

    #[test]
    fn test_ratio_overflow_is_out_of_range() {
        let err = validate(&draft(
            SignalDirection::Buy,
            "0.0000000000000000000000000002",
            "0.0000000000000000000000000001",
            &["9999999999999999999999999999"],
        ))
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::PriceOutOfRange {
                field: PriceField::TakeProfit(0)
            }
        );
        assert!(err.to_string().contains("take profit 1"));
    }

    #[test]
    fn test_longest_exact_prices_accepted() {
        assert_eq!(
            parse_price("0.0000000000000000000000000001"),
            Some(Decimal::new(1, 28))
        );
        assert!(parse_price("9999999999999999999999999999").is_some());
    }

    #[test]
    fn test_prices_keep_input_precision() {
        let signal = validate(&draft(
            SignalDirection::Buy,
            "1.084501",
            "1.08",
            &["1.0900000"],
        ))
        .unwrap();

        assert_eq!(signal.entry.raw(), "1.084501");
        assert_eq!(signal.take_profit_levels()[0].price, "1.0900000");
        assert_eq!(signal.entry.display(), "1.08450");
    }

    // =========================================================================
    // Risk/reward arithmetic
    // =========================================================================

    #[test]
    fn test_compute_risk_reward_long_and_short() {
        assert_eq!(
            compute_risk_reward(dec!(100), dec!(90), dec!(125), true),
            Some(dec!(2.5))
        );
        assert_eq!(
            compute_risk_reward(dec!(100), dec!(110), dec!(70), false),
            Some(dec!(3))
        );
    }

    #[test]
    fn test_compute_risk_reward_losing_side_is_negative() {
        let ratio = compute_risk_reward(dec!(100), dec!(90), dec!(95), true).unwrap();
        assert_eq!(ratio, dec!(-0.5));
        assert_eq!(format_ratio(ratio), "-0.5R");
    }

    #[test]
    fn test_compute_risk_reward_overflow_is_none() {
        let tiny = Decimal::new(1, 28);
        assert_eq!(compute_risk_reward(tiny * dec!(2), tiny, Decimal::MAX, true), None);
    }

    #[test]
    fn test_compute_risk_reward_zero_risk_is_undefined() {
        assert_eq!(compute_risk_reward(dec!(1.1), dec!(1.1), dec!(1.2), true), None);
    }

    #[test]
    fn test_ratio_scale_invariance() {
        let (entry, stop, tp) = (dec!(1.08450), dec!(1.08200), dec!(1.09130));
        let base = compute_risk_reward(entry, stop, tp, true).unwrap();

        for factor in [dec!(2), dec!(10), dec!(0.5), dec!(1000)] {
            let scaled =
                compute_risk_reward(entry * factor, stop * factor, tp * factor, true).unwrap();
            assert_eq!(scaled.round_dp(12), base.round_dp(12), "factor {factor}");
            assert_eq!(format_ratio(scaled), format_ratio(base));
        }
    }

    #[test]
    fn test_format_ratio_rounding() {
        assert_eq!(format_ratio(dec!(2.44)), "2.4R");
        assert_eq!(format_ratio(dec!(2.45)), "2.5R");
        assert_eq!(format_ratio(dec!(3)), "3.0R");
        assert_eq!(format_ratio(dec!(0.333333)), "0.3R");
        assert_eq!(format_ratio(dec!(-1.25)), "-1.3R");
    }

    #[test]
    fn test_format_price_fixed_decimals() {
        assert_eq!(format_price(dec!(1.0845)), "1.08450");
        assert_eq!(format_price(dec!(1.084506)), "1.08451");
        assert_eq!(format_price(dec!(150)), "150.00000");
    }

    #[test]
    fn test_revalidation_is_stable() {
        let d = draft(SignalDirection::Sell, "2000.5", "2010", &["1990", "1971.5"]);
        let first = validate(&d).unwrap();
        let second = d.validate().unwrap();

        assert_eq!(first, second);
        assert_eq!(ratios(&first), vec!["1.1R", "3.1R"]);
    }

    // =========================================================================
    // Live preview
    // =========================================================================

    #[test]
    fn test_preview_tolerates_partial_input() {
        let preview = preview_ratios(
            SignalDirection::Buy,
            "1.0845",
            "1.08",
            &["1.09".to_string(), "1.".to_string(), "".to_string(), "1.0x".to_string()],
        );

        assert_eq!(preview.risk.as_deref(), Some("0.00450"));
        assert_eq!(
            preview.ratios,
            vec![Some("1.2R".to_string()), Some("-18.8R".to_string()), None, None]
        );
    }

    #[test]
    fn test_preview_zero_risk_shows_placeholder() {
        let preview = preview_ratios(SignalDirection::Sell, "1.2", "1.2", &["1.1".to_string()]);

        assert!(preview.risk.is_none());
        assert_eq!(preview.display_ratios(), vec![RATIO_PLACEHOLDER.to_string()]);
    }

    #[test]
    fn test_preview_without_entry() {
        let preview = preview_ratios(SignalDirection::Buy, "", "1.08", &["1.09".to_string()]);
        assert!(preview.risk.is_none());
        assert_eq!(preview.ratios, vec![None]);
    }
}
