use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_verify_interval_secs() -> u64 {
    3600
}

fn default_max_age_hours() -> u64 {
    24
}

fn default_probe_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Calibrate when the monitor process starts, even if the stored snapshot is fresh.
    #[serde(default = "default_true")]
    pub auto_run_on_start: bool,
    #[serde(default = "default_verify_interval_secs")]
    pub verify_interval_secs: u64,
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            auto_run_on_start: true,
            verify_interval_secs: default_verify_interval_secs(),
            max_age_hours: default_max_age_hours(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl CalibrationConfig {
    /// Saturates at `TimeDelta::MAX` for hour counts chrono cannot represent.
    pub fn max_age(&self) -> chrono::Duration {
        i64::try_from(self.max_age_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::TimeDelta::MAX)
    }
}

fn default_monitor_interval_secs() -> u64 {
    300
}

fn default_slow_threshold_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_monitor_interval_secs")]
    pub interval_secs: u64,
    /// Liveness probes slower than this are reported as `slow`.
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
    #[serde(default)]
    pub alert_webhook_url: Option<String>,
    /// When set, webhook alerts carry an `X-Waypoint-Signature` HMAC header.
    #[serde(default)]
    pub alert_webhook_secret: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_monitor_interval_secs(),
            slow_threshold_ms: default_slow_threshold_ms(),
            alert_webhook_url: None,
            alert_webhook_secret: None,
        }
    }
}
