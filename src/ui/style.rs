use crate::calibration::CalibrationState;
use crate::health::{HealthStatus, OverallHealth};
use console::style;
use std::fmt::Display;

/// White bold: section headers, titles
pub fn header<D: Display>(text: D) -> String {
    style(text).white().bold().to_string()
}

/// Dim: secondary text, timestamps, decorative lines
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Cyan: connector names, field labels
pub fn label<D: Display>(text: D) -> String {
    style(text).cyan().to_string()
}

pub fn ok<D: Display>(text: D) -> String {
    style(text).green().bold().to_string()
}

pub fn warn<D: Display>(text: D) -> String {
    style(text).yellow().bold().to_string()
}

pub fn fail<D: Display>(text: D) -> String {
    style(text).red().bold().to_string()
}

pub fn calibration_state(state: CalibrationState) -> String {
    match state {
        CalibrationState::Authenticated => ok(state),
        CalibrationState::Pending => warn(state),
        CalibrationState::Failed => fail(state),
    }
}

pub fn health_status(status: HealthStatus) -> String {
    match status {
        HealthStatus::Healthy => ok(status),
        HealthStatus::Slow => warn(status),
        HealthStatus::Failed => fail(status),
    }
}

pub fn overall_health(overall: OverallHealth) -> String {
    match overall {
        OverallHealth::Healthy => ok(overall),
        OverallHealth::Warning => warn(overall),
        OverallHealth::Degraded => fail(overall),
    }
}
