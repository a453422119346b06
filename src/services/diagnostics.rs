use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::bus::DiagnosticBus;
use crate::constants::events;
use crate::events::Diagnostic;

/// Running counts of pipeline outcomes
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DiagnosticCounts {
    pub filtered: u64,
    pub parse_skipped: u64,
    pub malformed_quantity: u64,
    pub accepted: u64,
    pub duplicates: u64,
    pub snapshots_saved: u64,
    pub persistence_failures: u64,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub last_persistence_error: Option<String>,
}

/// The diagnostic sink: consumes the bus and keeps [`DiagnosticCounts`].
#[derive(Clone, Default)]
pub struct DiagnosticsTally {
    counts: Arc<Mutex<DiagnosticCounts>>,
}

impl DiagnosticsTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> DiagnosticCounts {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn start(&self, bus: &DiagnosticBus) {
        let mut rx = bus.subscribe();
        let tally = self.clone();

        tokio::spawn(async move {
            info!("📈 Diagnostics tally started");
            loop {
                match rx.recv().await {
                    Ok(event) => tally.record(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Diagnostics tally lagged, {} events dropped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    pub fn record(&self, event: &Diagnostic) {
        let mut c = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        match event {
            Diagnostic::MessageFiltered { .. } => c.filtered += 1,
            Diagnostic::ParseSkipped { channel, reason } => {
                c.parse_skipped += 1;
                tracing::debug!(
                    event = events::PARSE_SKIPPED,
                    channel = channel.as_deref().unwrap_or("manual"),
                    "Not a signal: {}",
                    reason
                );
            }
            Diagnostic::MalformedQuantity { period_id, payload } => {
                c.malformed_quantity += 1;
                warn!(
                    event = events::MALFORMED_QUANTITY,
                    period_id = %period_id,
                    "Unparsable quantity '{}', stored without quantity",
                    payload
                );
            }
            Diagnostic::SignalAccepted { .. } => c.accepted += 1,
            Diagnostic::DuplicateSignal { .. } => c.duplicates += 1,
            Diagnostic::SnapshotSaved { .. } => {
                c.snapshots_saved += 1;
                c.last_saved_at = Some(Utc::now());
            }
            Diagnostic::PersistenceFailed { operation, error, .. } => {
                c.persistence_failures += 1;
                c.last_persistence_error = Some(format!("{}: {}", operation, error));
            }
            Diagnostic::SnapshotLoaded { .. } | Diagnostic::ColdStart { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::SignalResult;
    use crate::parser::SkipReason;

    #[test]
    fn test_record_counts() {
        let tally = DiagnosticsTally::new();
        tally.record(&Diagnostic::SignalAccepted {
            period_id: "1".to_string(),
            result: SignalResult::Win,
            total: 1,
        });
        tally.record(&Diagnostic::DuplicateSignal { period_id: "1".to_string() });
        tally.record(&Diagnostic::ParseSkipped {
            channel: None,
            reason: SkipReason::MissingResult,
        });
        tally.record(&Diagnostic::PersistenceFailed {
            gateway: "r2",
            operation: "save",
            error: "HTTP 403: denied".to_string(),
        });

        let counts = tally.counts();
        assert_eq!(counts.accepted, 1);
        assert_eq!(counts.duplicates, 1);
        assert_eq!(counts.parse_skipped, 1);
        assert_eq!(counts.persistence_failures, 1);
        assert_eq!(counts.last_persistence_error.as_deref(), Some("save: HTTP 403: denied"));
        assert!(counts.last_saved_at.is_none());
    }

    #[tokio::test]
    async fn test_tally_consumes_bus() {
        let bus = DiagnosticBus::new(16);
        let tally = DiagnosticsTally::new();
        tally.start(&bus);

        bus.publish(Diagnostic::SnapshotSaved { gateway: "memory", records: 3 });
        bus.publish(Diagnostic::MessageFiltered { channel: "@spam".to_string() });

        for _ in 0..50 {
            if tally.counts().filtered == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let counts = tally.counts();
        assert_eq!(counts.snapshots_saved, 1);
        assert_eq!(counts.filtered, 1);
        assert!(counts.last_saved_at.is_some());
    }
}
