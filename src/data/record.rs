use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::storage::RECORD_TIMESTAMP_FORMAT;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalResult {
    Win,
    Lose,
}

impl SignalResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalResult::Win => "Win",
            SignalResult::Lose => "Lose",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "Win" => Some(SignalResult::Win),
            "Lose" => Some(SignalResult::Lose),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignalResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeRecommendation {
    Green,
    Red,
    #[default]
    None,
}

impl TradeRecommendation {
    fn to_wire(self) -> Option<String> {
        match self {
            TradeRecommendation::Green => Some("Green".to_string()),
            TradeRecommendation::Red => Some("Red".to_string()),
            TradeRecommendation::None => None,
        }
    }

    fn from_wire(s: Option<&str>) -> Self {
        match s {
            Some("Green") => TradeRecommendation::Green,
            Some("Red") => TradeRecommendation::Red,
            _ => TradeRecommendation::None,
        }
    }
}

/// One parsed, validated outcome event.
///
/// Fields are private so a record can only come out of the parser (or a
/// loaded snapshot) with `period_id` and `result` set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireSignal", try_from = "WireSignal")]
pub struct SignalRecord {
    period_id: String,
    result: SignalResult,
    trade: TradeRecommendation,
    quantity: Option<f64>,
    received_at: DateTime<Utc>,
    raw_excerpt: String,
}

impl SignalRecord {
    pub(crate) fn new(
        period_id: String,
        result: SignalResult,
        trade: TradeRecommendation,
        quantity: Option<f64>,
        received_at: DateTime<Utc>,
        raw_excerpt: String,
    ) -> Self {
        Self {
            period_id,
            result,
            trade,
            quantity,
            // Whole seconds, matching the persisted timestamp layout.
            received_at: received_at.trunc_subsecs(0),
            raw_excerpt,
        }
    }

    pub fn period_id(&self) -> &str {
        &self.period_id
    }

    pub fn result(&self) -> SignalResult {
        self.result
    }

    pub fn trade(&self) -> TradeRecommendation {
        self.trade
    }

    pub fn quantity(&self) -> Option<f64> {
        self.quantity
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn raw_excerpt(&self) -> &str {
        &self.raw_excerpt
    }

    pub fn is_win(&self) -> bool {
        self.result == SignalResult::Win
    }
}

/// Persisted shape of one signal, kept compatible with objects already in
/// the bucket.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireSignal {
    #[serde(default)]
    pub period_id: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub trade: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<SignalRecord> for WireSignal {
    fn from(r: SignalRecord) -> Self {
        Self {
            period_id: Some(r.period_id),
            result: Some(r.result.as_str().to_string()),
            trade: r.trade.to_wire(),
            quantity: r.quantity,
            timestamp: Some(r.received_at.format(RECORD_TIMESTAMP_FORMAT).to_string()),
            message: Some(r.raw_excerpt),
        }
    }
}

impl TryFrom<WireSignal> for SignalRecord {
    type Error = String;

    fn try_from(w: WireSignal) -> Result<Self, Self::Error> {
        let period_id = w
            .period_id
            .filter(|p| !p.is_empty())
            .ok_or_else(|| "signal is missing period_id".to_string())?;
        let result = w
            .result
            .as_deref()
            .and_then(SignalResult::from_wire)
            .ok_or_else(|| format!("signal {} has no usable result", period_id))?;

        Ok(Self {
            period_id,
            result,
            trade: TradeRecommendation::from_wire(w.trade.as_deref()),
            quantity: w.quantity.filter(|q| q.is_finite() && *q > 0.0),
            received_at: w
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            raw_excerpt: w.message.unwrap_or_default(),
        })
    }
}

/// Accepts the record layout, RFC 3339, and naive ISO-8601 (treated as UTC).
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    [RECORD_TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Full serialized state: the unit of durable persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "SnapshotDocument", from = "SnapshotDocument")]
pub struct Snapshot {
    pub records: Vec<SignalRecord>,
    pub last_updated: DateTime<Utc>,
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
}

impl Snapshot {
    pub fn from_records(records: Vec<SignalRecord>, last_updated: DateTime<Utc>) -> Self {
        let wins = records.iter().filter(|r| r.is_win()).count();
        Self {
            total: records.len(),
            losses: records.len() - wins,
            wins,
            records,
            last_updated,
        }
    }

    pub fn empty() -> Self {
        Self::from_records(Vec::new(), Utc::now())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub signals: Vec<serde_json::Value>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub total_signals: usize,
    #[serde(default)]
    pub wins: usize,
    #[serde(default)]
    pub losses: usize,
}

impl From<Snapshot> for SnapshotDocument {
    fn from(s: Snapshot) -> Self {
        Self {
            signals: s
                .records
                .into_iter()
                .filter_map(|r| serde_json::to_value(WireSignal::from(r)).ok())
                .collect(),
            last_updated: Some(s.last_updated.to_rfc3339()),
            total_signals: s.total,
            wins: s.wins,
            losses: s.losses,
        }
    }
}

impl From<SnapshotDocument> for Snapshot {
    /// Entries that are not valid signals are dropped; counts are recomputed
    /// from what survives.
    fn from(doc: SnapshotDocument) -> Self {
        let records = doc
            .signals
            .into_iter()
            .filter_map(|v| serde_json::from_value::<WireSignal>(v).ok())
            .filter_map(|w| SignalRecord::try_from(w).ok())
            .collect();
        let last_updated = doc
            .last_updated
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Snapshot::from_records(records, last_updated)
    }
}
