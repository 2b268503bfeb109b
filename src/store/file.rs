use super::{CALIBRATION_EXPORT_FILE, CALIBRATION_FILE, HEALTH_FILE, SnapshotStore};
use crate::calibration::CalibrationSnapshot;
use crate::error::PersistenceError;
use crate::health::HealthSnapshot;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// JSON files under a state directory, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn calibration_path(&self) -> PathBuf {
        self.dir.join(CALIBRATION_FILE)
    }

    pub fn export_path(&self) -> PathBuf {
        self.dir.join(CALIBRATION_EXPORT_FILE)
    }

    pub fn health_path(&self) -> PathBuf {
        self.dir.join(HEALTH_FILE)
    }

    /// Human-readable mirror of the snapshot. Never authoritative.
    async fn export_yaml(&self, snapshot: &CalibrationSnapshot) -> Result<(), PersistenceError> {
        let yaml =
            serde_yaml::to_string(snapshot).map_err(|e| PersistenceError::Encode(e.to_string()))?;
        write_atomic(&self.export_path(), yaml.as_bytes()).await
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), PersistenceError> {
    let write_error = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(write_error)?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    fs::write(&temp_path, content).await.map_err(write_error)?;

    if let Err(rename_error) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(write_error(rename_error));
    }
    Ok(())
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let json =
        serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::Encode(e.to_string()))?;
    write_atomic(path, &json).await
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| PersistenceError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, snapshot: &CalibrationSnapshot) -> Result<(), PersistenceError> {
        write_json(&self.calibration_path(), snapshot).await?;
        tracing::debug!(path = %self.calibration_path().display(), "calibration snapshot saved");

        if let Err(e) = self.export_yaml(snapshot).await {
            tracing::warn!(error = %e, "calibration export failed");
        }
        Ok(())
    }

    async fn load(&self) -> Result<Option<CalibrationSnapshot>, PersistenceError> {
        read_json(&self.calibration_path()).await
    }

    async fn save_health(&self, health: &HealthSnapshot) -> Result<(), PersistenceError> {
        write_json(&self.health_path(), health).await
    }

    async fn load_health(&self) -> Result<Option<HealthSnapshot>, PersistenceError> {
        read_json(&self.health_path()).await
    }
}
