use chrono::{DateTime, Utc};

use crate::data::record::SignalResult;
use crate::parser::SkipReason;

/// Identity of the channel a message arrived on. Transports fill whichever
/// parts they know.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelRef {
    pub name: Option<String>,
    pub id: Option<i64>,
}

impl ChannelRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), id: None }
    }

    pub fn with_id(id: i64) -> Self {
        Self { name: None, id: Some(id) }
    }
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.name, self.id) {
            (Some(name), Some(id)) => write!(f, "@{} ({})", name, id),
            (Some(name), None) => write!(f, "@{}", name),
            (None, Some(id)) => write!(f, "{}", id),
            (None, None) => f.write_str("<unknown>"),
        }
    }
}

/// One message delivered by a transport
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub channel: ChannelRef,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// Pipeline outcomes routed to the diagnostic sink. None of these feed back
/// into the caller's control flow.
#[derive(Clone, Debug)]
pub enum Diagnostic {
    MessageFiltered {
        channel: String,
    },
    ParseSkipped {
        channel: Option<String>,
        reason: SkipReason,
    },
    MalformedQuantity {
        period_id: String,
        payload: String,
    },
    SignalAccepted {
        period_id: String,
        result: SignalResult,
        total: usize,
    },
    DuplicateSignal {
        period_id: String,
    },
    SnapshotSaved {
        gateway: &'static str,
        records: usize,
    },
    PersistenceFailed {
        gateway: &'static str,
        operation: &'static str,
        error: String,
    },
    SnapshotLoaded {
        gateway: &'static str,
        records: usize,
    },
    ColdStart {
        gateway: &'static str,
        reason: String,
    },
}
