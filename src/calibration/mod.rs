//! Calibration: discovering who each connector authenticates as, and
//! remembering it as an immutable snapshot.

pub mod calibrator;
pub mod snapshot;

pub use calibrator::Calibrator;
pub use snapshot::{
    BotFacts, CalibrationSnapshot, CalibrationState, ConnectorFacts, ConnectorStats,
    ConnectorStatus, ContainerFacts, SNAPSHOT_VERSION, UserFacts,
};
