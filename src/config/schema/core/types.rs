use super::super::{CalibrationConfig, ConnectorsConfig, EnforcementConfig, MonitorConfig};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory holding calibration/health snapshots. `~` is expanded.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    #[serde(default)]
    pub connectors: ConnectorsConfig,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub enforcement: EnforcementConfig,
}

fn default_state_dir() -> String {
    "~/.waypoint/state".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config.toml"),
            state_dir: default_state_dir(),
            connectors: ConnectorsConfig::default(),
            calibration: CalibrationConfig::default(),
            monitor: MonitorConfig::default(),
            enforcement: EnforcementConfig::default(),
        }
    }
}

impl Config {
    pub fn state_dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.state_dir).into_owned())
    }

    /// Checks everything that must hold before any connector is probed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let configured = self.connectors.configured();
        if configured.is_empty() {
            return Err(ConfigError::Validation(
                "no connectors configured; add a [connectors.<name>] table or set a token env var"
                    .into(),
            ));
        }

        for (kind, connector) in configured {
            if connector.token.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "connectors.{kind}.token is empty"
                )));
            }
            if let Some(base_url) = &connector.base_url {
                url::Url::parse(base_url).map_err(|e| {
                    ConfigError::Validation(format!("connectors.{kind}.base_url: {e}"))
                })?;
            }
        }

        if let Some(webhook) = &self.monitor.alert_webhook_url {
            url::Url::parse(webhook)
                .map_err(|e| ConfigError::Validation(format!("monitor.alert_webhook_url: {e}")))?;
        }

        let positive = [
            ("calibration.verify_interval_secs", self.calibration.verify_interval_secs),
            ("calibration.probe_timeout_secs", self.calibration.probe_timeout_secs),
            ("monitor.interval_secs", self.monitor.interval_secs),
            (
                "enforcement.max_chain_depth",
                u64::try_from(self.enforcement.max_chain_depth).unwrap_or(u64::MAX),
            ),
            (
                "enforcement.max_pagination_pages",
                u64::from(self.enforcement.max_pagination_pages),
            ),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Validation(format!("{name} must be at least 1")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectorConfig;

    fn configured() -> Config {
        let mut config = Config::default();
        config.connectors.linear = Some(ConnectorConfig::with_token("lin_api_x"));
        config
    }

    #[test]
    fn validate_rejects_empty_connector_set() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("no connectors configured"));
    }

    #[test]
    fn validate_rejects_blank_token() {
        let mut config = configured();
        config.connectors.github = Some(ConnectorConfig::with_token("  "));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connectors.github.token"));
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = configured();
        if let Some(linear) = config.connectors.linear.as_mut() {
            linear.base_url = Some("not a url".into());
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_chain_depth() {
        let mut config = configured();
        config.enforcement.max_chain_depth = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_chain_depth"));
    }

    #[test]
    fn validate_accepts_minimal_config() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn state_dir_keeps_absolute_paths() {
        let config = Config {
            state_dir: "/var/lib/waypoint".into(),
            ..Config::default()
        };
        assert_eq!(config.state_dir_path(), PathBuf::from("/var/lib/waypoint"));
        assert!(Config::default().state_dir_path().ends_with(".waypoint/state"));
    }
}
