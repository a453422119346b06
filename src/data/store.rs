use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, info};

use crate::bus::DiagnosticBus;
use crate::constants::store::{MAX_SIGNALS, ROLLING_WINDOW};
use crate::events::{ChannelRef, Diagnostic};
use crate::parser::{self, ParseOutcome, SkipReason};
use crate::persistence::SnapshotSender;

use super::record::{SignalRecord, Snapshot};
use super::stats::SignalStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    Accepted,
    Duplicate,
}

impl AppendOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AppendOutcome::Accepted)
    }
}

/// Result of pushing raw text through parse + append
#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    Accepted(SignalRecord),
    Duplicate(String),
    NotASignal(SkipReason),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecentOrder {
    Chronological,
    #[default]
    NewestFirst,
}

/// Bounded, deduplicated signal history in arrival order.
///
/// Cloning gives another handle to the same store. Every mutation runs
/// under one write lock, and every read copies its result out, so readers
/// only ever see a whole state.
#[derive(Clone)]
pub struct SignalStore {
    signals: Arc<RwLock<VecDeque<SignalRecord>>>,
    persistence: Option<SnapshotSender>,
    diagnostics: Option<DiagnosticBus>,
}

impl Default for SignalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalStore {
    pub fn new() -> Self {
        Self {
            signals: Arc::new(RwLock::new(VecDeque::with_capacity(MAX_SIGNALS + 1))),
            persistence: None,
            diagnostics: None,
        }
    }

    /// Queue a snapshot for saving after every accepted append
    pub fn with_persistence(mut self, sender: SnapshotSender) -> Self {
        self.persistence = Some(sender);
        self
    }

    pub fn with_diagnostics(mut self, bus: DiagnosticBus) -> Self {
        self.diagnostics = Some(bus);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<SignalRecord>> {
        self.signals.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<SignalRecord>> {
        self.signals.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: Diagnostic) {
        if let Some(bus) = &self.diagnostics {
            bus.publish(event);
        }
    }

    /// Dedup check, tail push and eviction. Caller holds the write lock.
    fn insert_locked(signals: &mut VecDeque<SignalRecord>, record: SignalRecord) -> bool {
        if signals.iter().any(|s| s.period_id() == record.period_id()) {
            return false;
        }
        signals.push_back(record);
        while signals.len() > MAX_SIGNALS {
            signals.pop_front();
        }
        true
    }

    pub fn append(&self, record: SignalRecord) -> AppendOutcome {
        let period_id = record.period_id().to_string();
        let result = record.result();

        let total = {
            let mut signals = self.write();
            if !Self::insert_locked(&mut signals, record) {
                drop(signals);
                debug!("Duplicate signal ignored: {}", period_id);
                self.publish(Diagnostic::DuplicateSignal { period_id });
                return AppendOutcome::Duplicate;
            }

            // Queued while still locked so saves follow acceptance order.
            if let Some(sender) = &self.persistence {
                sender.enqueue(Snapshot::from_records(
                    signals.iter().cloned().collect(),
                    Utc::now(),
                ));
            }
            signals.len()
        };

        info!("✅ Signal added: {} - {}", period_id, result);
        self.publish(Diagnostic::SignalAccepted {
            period_id,
            result,
            total,
        });
        AppendOutcome::Accepted
    }

    /// Hydrate from a loaded snapshot under the same cap and dedup rules.
    /// Does not trigger a save. Returns how many records were taken.
    pub fn seed(&self, snapshot: Snapshot) -> usize {
        let mut signals = self.write();
        let mut taken = 0;
        for record in snapshot.records {
            if Self::insert_locked(&mut signals, record) {
                taken += 1;
            }
        }
        taken.min(signals.len())
    }

    /// Parse raw operator text and append it, exactly like the ingestion path.
    pub fn submit_manual(&self, raw: &str) -> Submission {
        self.submit_parsed(parser::parse_detailed(raw, Utc::now()), None)
    }

    pub fn submit_parsed(&self, outcome: ParseOutcome, source: Option<&ChannelRef>) -> Submission {
        let parsed = match outcome {
            ParseOutcome::Signal(parsed) => parsed,
            ParseOutcome::Skip(reason) => {
                self.publish(Diagnostic::ParseSkipped {
                    channel: source.map(|c| c.to_string()),
                    reason,
                });
                return Submission::NotASignal(reason);
            }
        };

        if let Some(payload) = parsed.malformed_quantity {
            self.publish(Diagnostic::MalformedQuantity {
                period_id: parsed.record.period_id().to_string(),
                payload,
            });
        }

        match self.append(parsed.record.clone()) {
            AppendOutcome::Accepted => Submission::Accepted(parsed.record),
            AppendOutcome::Duplicate => Submission::Duplicate(parsed.record.period_id().to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn contains(&self, period_id: &str) -> bool {
        self.read().iter().any(|s| s.period_id() == period_id)
    }

    pub fn stats(&self) -> SignalStats {
        SignalStats::compute(self.read().iter())
    }

    /// Up to `n` of the newest records, copied out.
    pub fn recent(&self, n: usize, order: RecentOrder) -> Vec<SignalRecord> {
        let signals = self.read();
        let skip = signals.len().saturating_sub(n);
        let mut out: Vec<SignalRecord> = signals.iter().skip(skip).cloned().collect();
        if order == RecentOrder::NewestFirst {
            out.reverse();
        }
        out
    }

    /// The most recent window of records, oldest first
    pub fn rolling_view(&self) -> Vec<SignalRecord> {
        self.recent(ROLLING_WINDOW, RecentOrder::Chronological)
    }

    pub fn latest(&self) -> Option<SignalRecord> {
        self.read().back().cloned()
    }

    pub fn all(&self) -> Vec<SignalRecord> {
        self.read().iter().cloned().collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_records(self.all(), Utc::now())
    }
}
