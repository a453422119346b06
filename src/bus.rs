use crate::events::Diagnostic;
use tokio::sync::broadcast;

/// Fan-out channel for pipeline diagnostics.
///
/// Publishing never blocks and never fails the publisher; with no
/// subscribers the event is simply dropped.
#[derive(Clone)]
pub struct DiagnosticBus {
    tx: broadcast::Sender<Diagnostic>,
}

impl DiagnosticBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: Diagnostic) {
        let _ = self.tx.send(event);
    }
}
