use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::bus::DiagnosticBus;
use crate::data::record::Snapshot;
use crate::events::Diagnostic;

use super::SnapshotGateway;

enum Command {
    Save(Snapshot),
    /// Answered once every save queued before it has been attempted
    Flush(oneshot::Sender<()>),
}

/// Handle the store uses to queue snapshots. Sending never blocks.
/// The queue is unbounded and holds at most one snapshot per accepted signal.
#[derive(Clone)]
pub struct SnapshotSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl SnapshotSender {
    pub fn enqueue(&self, snapshot: Snapshot) {
        if self.tx.send(Command::Save(snapshot)).is_err() {
            debug!("Persistence worker stopped, snapshot dropped");
        }
    }

    /// Wait until every snapshot queued so far has been saved or has failed.
    /// Returns false if the worker is no longer running.
    pub async fn flush(&self) -> bool {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).is_err() {
            return false;
        }
        done_rx.await.is_ok()
    }
}

/// Drains queued snapshots and saves each one, in order, off the ingestion path.
pub struct PersistenceWorker {
    gateway: Arc<dyn SnapshotGateway>,
    diagnostics: DiagnosticBus,
}

impl PersistenceWorker {
    pub fn new(gateway: Arc<dyn SnapshotGateway>, diagnostics: DiagnosticBus) -> Self {
        Self {
            gateway,
            diagnostics,
        }
    }

    pub fn spawn(self) -> (SnapshotSender, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(rx));
        (SnapshotSender { tx }, handle)
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<Command>) {
        info!("💾 Persistence worker started (gateway: {})", self.gateway.name());

        while let Some(command) = rx.recv().await {
            match command {
                Command::Save(snapshot) => self.save(snapshot).await,
                Command::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        info!("💾 Persistence worker stopped");
    }

    async fn save(&self, snapshot: Snapshot) {
        let records = snapshot.records.len();
        match self.gateway.save(&snapshot).await {
            Ok(()) => {
                info!("✅ Snapshot uploaded to {} ({} signals)", self.gateway.name(), records);
                self.diagnostics.publish(Diagnostic::SnapshotSaved {
                    gateway: self.gateway.name(),
                    records,
                });
            }
            Err(e) => {
                error!("❌ Error uploading snapshot to {}: {}", self.gateway.name(), e);
                self.diagnostics.publish(Diagnostic::PersistenceFailed {
                    gateway: self.gateway.name(),
                    operation: "save",
                    error: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryGateway;
    use crate::parser::parse;

    #[tokio::test]
    async fn test_flush_waits_for_queued_saves() {
        let gateway = Arc::new(MemoryGateway::new());
        let (sender, _handle) = PersistenceWorker::new(gateway.clone(), DiagnosticBus::new(8)).spawn();

        for i in 1..=3 {
            let record = parse(&format!("period ID: {} Result:Win", i)).unwrap();
            sender.enqueue(Snapshot::from_records(vec![record], chrono::Utc::now()));
        }

        assert!(sender.flush().await);
        assert_eq!(gateway.save_count(), 3);
    }

    #[tokio::test]
    async fn test_flush_after_worker_stopped() {
        let gateway = Arc::new(MemoryGateway::new());
        let (sender, handle) = PersistenceWorker::new(gateway, DiagnosticBus::new(8)).spawn();
        handle.abort();
        let _ = handle.await;

        assert!(!sender.flush().await);
    }
}
