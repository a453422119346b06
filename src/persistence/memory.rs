use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::data::record::Snapshot;
use crate::error::{PersistenceError, PersistenceResult};

use super::SnapshotGateway;

/// Keeps the serialized snapshot in process memory.
///
/// Stores the JSON bytes rather than the struct so a load goes through the
/// same decoding as the remote gateway.
#[derive(Clone, Default)]
pub struct MemoryGateway {
    object: Arc<Mutex<Option<Vec<u8>>>>,
    saves: Arc<Mutex<usize>>,
    fail_saves: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose saves always fail, for exercising the failure path
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn raw_object(&self) -> Option<Vec<u8>> {
        self.object.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl SnapshotGateway for MemoryGateway {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn save(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        if self.fail_saves {
            return Err(PersistenceError::Http {
                status: 503,
                body: "memory gateway configured to fail".to_string(),
            });
        }
        let body = serde_json::to_vec(snapshot)?;
        *self.object.lock().unwrap_or_else(PoisonError::into_inner) = Some(body);
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    async fn load(&self) -> PersistenceResult<Option<Snapshot>> {
        match self.raw_object() {
            Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
            None => Ok(None),
        }
    }
}
