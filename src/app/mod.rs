pub mod daemon;
pub mod dispatch;
pub mod status;

use crate::calibration::Calibrator;
use crate::config::Config;
use crate::connectors::{ConnectorSet, create_connectors};
use crate::enforcement::Enforcer;
use crate::error::ConfigError;
use crate::health::{HealthMonitor, create_alert_sink};
use crate::store::{FileSnapshotStore, SnapshotStore};
use std::sync::Arc;
use std::time::Duration;

/// How a command ended, beyond plain success or an aborting error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NoSnapshot,
    ConnectorsFailed,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::NoSnapshot => 2,
            Self::ConnectorsFailed => 3,
        }
    }
}

/// Everything a command needs, wired once from validated config.
pub struct Services {
    pub config: Arc<Config>,
    pub connectors: ConnectorSet,
    pub store: Arc<dyn SnapshotStore>,
    pub calibrator: Calibrator,
}

impl Services {
    pub fn from_config(config: Arc<Config>) -> Result<Self, ConfigError> {
        config.validate()?;
        let store: Arc<dyn SnapshotStore> =
            Arc::new(FileSnapshotStore::new(config.state_dir_path()));
        Ok(Self::with_store(config, store))
    }

    /// Skips validation; callers supply an already-checked config.
    pub fn with_store(config: Arc<Config>, store: Arc<dyn SnapshotStore>) -> Self {
        let connectors = create_connectors(&config);
        let calibrator = Calibrator::new(
            connectors.clone(),
            Arc::clone(&store),
            probe_timeout(&config),
        );
        Self {
            config,
            connectors,
            store,
            calibrator,
        }
    }

    pub fn enforcer(&self) -> Enforcer {
        Enforcer::new(self.config.enforcement.clone())
            .with_resolver(Arc::new(self.connectors.clone()))
    }

    pub fn health_monitor(&self) -> HealthMonitor {
        HealthMonitor::new(
            self.connectors.clone(),
            Arc::clone(&self.store),
            create_alert_sink(&self.config.monitor),
            &self.config.monitor,
            probe_timeout(&self.config),
        )
    }
}

fn probe_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.calibration.probe_timeout_secs.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        assert_eq!(Outcome::Success.exit_code(), 0);
        assert_eq!(Outcome::NoSnapshot.exit_code(), 2);
        assert_eq!(Outcome::ConnectorsFailed.exit_code(), 3);
    }

    #[test]
    fn unconfigured_services_are_rejected() {
        let err = Services::from_config(Arc::new(Config::default()))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
