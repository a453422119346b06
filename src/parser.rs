//! Signal message parser
//!
//! Turns free-form channel text into a [`SignalRecord`]. Most channel traffic
//! is not a signal, so "no record" is the normal outcome and never an error.

use chrono::{DateTime, Utc};

use crate::constants::{store::EXCERPT_CHARS, tokens};
use crate::data::record::{SignalRecord, SignalResult, TradeRecommendation};

/// Why a message did not produce a record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    MissingPeriodId,
    MissingResult,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingPeriodId => f.write_str("no period ID"),
            SkipReason::MissingResult => f.write_str("no result marker"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedSignal {
    pub record: SignalRecord,
    /// Raw quantity payload that could not be used; the record carries no quantity
    pub malformed_quantity: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParseOutcome {
    Signal(ParsedSignal),
    Skip(SkipReason),
}

impl ParseOutcome {
    pub fn into_record(self) -> Option<SignalRecord> {
        match self {
            ParseOutcome::Signal(parsed) => Some(parsed.record),
            ParseOutcome::Skip(_) => None,
        }
    }
}

/// Parse a message received now.
pub fn parse(raw: &str) -> Option<SignalRecord> {
    parse_detailed(raw, Utc::now()).into_record()
}

/// Parse a message, reporting why it was skipped or whether its quantity
/// payload had to be dropped.
pub fn parse_detailed(raw: &str, received_at: DateTime<Utc>) -> ParseOutcome {
    let Some(period_id) = extract_period_id(raw) else {
        return ParseOutcome::Skip(SkipReason::MissingPeriodId);
    };
    let Some(result) = extract_result(raw) else {
        return ParseOutcome::Skip(SkipReason::MissingResult);
    };

    let (quantity, malformed_quantity) = match extract_quantity(raw) {
        None => (None, None),
        Some(Ok(q)) => (Some(q), None),
        Some(Err(payload)) => (None, Some(payload)),
    };

    let record = SignalRecord::new(
        period_id,
        result,
        extract_trade(raw),
        quantity,
        received_at,
        raw.chars().take(EXCERPT_CHARS).collect(),
    );

    ParseOutcome::Signal(ParsedSignal {
        record,
        malformed_quantity,
    })
}

fn extract_period_id(raw: &str) -> Option<String> {
    after_token(raw, tokens::PERIOD_ID).find_map(|rest| {
        let digits: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        (!digits.is_empty()).then_some(digits)
    })
}

fn extract_result(raw: &str) -> Option<SignalResult> {
    if tokens::WIN_MARKERS.iter().any(|m| raw.contains(m)) {
        Some(SignalResult::Win)
    } else if tokens::LOSE_MARKERS.iter().any(|m| raw.contains(m)) {
        Some(SignalResult::Lose)
    } else {
        None
    }
}

fn extract_trade(raw: &str) -> TradeRecommendation {
    if raw.contains(tokens::GREEN_CHECK) {
        TradeRecommendation::Green
    } else if raw.contains(tokens::RED_CHECK) {
        TradeRecommendation::Red
    } else {
        TradeRecommendation::None
    }
}

/// `None` when there is no numeric payload after the token at all,
/// `Err(payload)` when the payload is present but unusable.
fn extract_quantity(raw: &str) -> Option<Result<f64, String>> {
    let payload = after_token(raw, tokens::QUANTITY).find_map(|rest| {
        let rest = rest.trim_start();
        let rest = rest.strip_prefix('x').unwrap_or(rest);
        let payload: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        (!payload.is_empty()).then_some(payload)
    })?;

    match payload.parse::<f64>() {
        Ok(q) if q.is_finite() && q > 0.0 => Some(Ok(q)),
        _ => Some(Err(payload)),
    }
}

/// Text following each occurrence of `token`, in order.
fn after_token<'a>(raw: &'a str, token: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    raw.match_indices(token)
        .map(move |(idx, _)| &raw[idx + token.len()..])
}
