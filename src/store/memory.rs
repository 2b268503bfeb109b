use super::SnapshotStore;
use crate::calibration::CalibrationSnapshot;
use crate::error::PersistenceError;
use crate::health::HealthSnapshot;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local store. Used where no state directory exists and by tests
/// that run on a paused clock.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    calibration: RwLock<Option<CalibrationSnapshot>>,
    health: RwLock<Option<HealthSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CalibrationSnapshot) -> Self {
        Self {
            calibration: RwLock::new(Some(snapshot)),
            health: RwLock::new(None),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, snapshot: &CalibrationSnapshot) -> Result<(), PersistenceError> {
        *self.calibration.write().await = Some(snapshot.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<CalibrationSnapshot>, PersistenceError> {
        Ok(self.calibration.read().await.clone())
    }

    async fn save_health(&self, health: &HealthSnapshot) -> Result<(), PersistenceError> {
        *self.health.write().await = Some(health.clone());
        Ok(())
    }

    async fn load_health(&self) -> Result<Option<HealthSnapshot>, PersistenceError> {
        Ok(self.health.read().await.clone())
    }
}
