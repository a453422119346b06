//! Durable snapshot storage
//!
//! Persistence is best-effort: a failed save is logged and forgotten, a
//! failed or empty load is a cold start. The in-memory store stays
//! authoritative either way.

pub mod memory;
pub mod r2;
pub mod sigv4;
pub mod worker;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::bus::DiagnosticBus;
use crate::data::record::Snapshot;
use crate::error::PersistenceResult;
use crate::events::Diagnostic;

pub use memory::MemoryGateway;
pub use r2::R2Gateway;
pub use worker::{PersistenceWorker, SnapshotSender};

#[async_trait]
pub trait SnapshotGateway: Send + Sync {
    fn name(&self) -> &'static str;

    /// Overwrite the well-known object with `snapshot`.
    async fn save(&self, snapshot: &Snapshot) -> PersistenceResult<()>;

    /// `Ok(None)` when no snapshot has ever been written.
    async fn load(&self) -> PersistenceResult<Option<Snapshot>>;
}

/// Load the last snapshot, treating absence and every error as an empty start.
pub async fn load_or_cold_start(
    gateway: &dyn SnapshotGateway,
    diagnostics: &DiagnosticBus,
) -> Option<Snapshot> {
    match gateway.load().await {
        Ok(Some(snapshot)) => {
            info!(
                "✅ Loaded {} existing signals from {}",
                snapshot.records.len(),
                gateway.name()
            );
            diagnostics.publish(Diagnostic::SnapshotLoaded {
                gateway: gateway.name(),
                records: snapshot.records.len(),
            });
            Some(snapshot)
        }
        Ok(None) => {
            info!("ℹ️ No existing snapshot in {}, starting empty", gateway.name());
            diagnostics.publish(Diagnostic::ColdStart {
                gateway: gateway.name(),
                reason: "no snapshot".to_string(),
            });
            None
        }
        Err(e) => {
            warn!("⚠️ Could not load snapshot from {}: {}", gateway.name(), e);
            diagnostics.publish(Diagnostic::ColdStart {
                gateway: gateway.name(),
                reason: e.to_string(),
            });
            None
        }
    }
}
