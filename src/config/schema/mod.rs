mod calibration;
mod connectors;
mod core;
mod enforcement;

pub use calibration::{CalibrationConfig, MonitorConfig};
pub use connectors::{ConnectorConfig, ConnectorsConfig};
pub use core::Config;
pub use enforcement::EnforcementConfig;
