pub mod schema;

pub use schema::{
    CalibrationConfig, Config, ConnectorConfig, ConnectorsConfig, EnforcementConfig,
    MonitorConfig,
};
