//! Durable home of the latest calibration and health snapshots.

mod file;
mod memory;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use crate::calibration::CalibrationSnapshot;
use crate::error::PersistenceError;
use crate::health::HealthSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

pub const CALIBRATION_FILE: &str = "calibration.json";
pub const CALIBRATION_EXPORT_FILE: &str = "calibration.yaml";
pub const HEALTH_FILE: &str = "health.json";

/// Keyed-value persistence for the two snapshot kinds. Every `save*` is a
/// full replace; `load*` yields `None` when nothing was ever saved.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, snapshot: &CalibrationSnapshot) -> Result<(), PersistenceError>;

    async fn load(&self) -> Result<Option<CalibrationSnapshot>, PersistenceError>;

    async fn save_health(&self, health: &HealthSnapshot) -> Result<(), PersistenceError>;

    async fn load_health(&self) -> Result<Option<HealthSnapshot>, PersistenceError>;

    async fn needs_refresh(&self, max_age: Duration) -> Result<bool, PersistenceError> {
        let snapshot = self.load().await?;
        Ok(needs_refresh_at(snapshot.as_ref(), Utc::now(), max_age))
    }
}

pub fn age_of(snapshot: &CalibrationSnapshot) -> Duration {
    snapshot.age()
}

/// Missing snapshots always need a refresh; present ones once strictly
/// older than `max_age`.
pub fn needs_refresh_at(
    snapshot: Option<&CalibrationSnapshot>,
    now: DateTime<Utc>,
    max_age: Duration,
) -> bool {
    snapshot.is_none_or(|snapshot| snapshot.is_stale_at(now, max_age))
}
