//! Periodic connector liveness: the health snapshot model, the monitor that
//! produces it, and alert delivery.

pub mod alert;
pub mod monitor;

pub use alert::{AlertSink, HealthAlert, LogAlertSink, WebhookAlertSink, create_alert_sink};
pub use monitor::HealthMonitor;

use crate::connectors::{ConnectorKind, LivenessReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Slow,
    Failed,
}

impl HealthStatus {
    /// A successful probe slower than `slow_threshold` is `slow`.
    pub fn classify(report: &LivenessReport, slow_threshold: Duration) -> Self {
        match report.outcome {
            Err(_) => Self::Failed,
            Ok(()) if report.latency > slow_threshold => Self::Slow,
            Ok(()) => Self::Healthy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OverallHealth {
    Healthy,
    Degraded,
    Warning,
}

impl OverallHealth {
    /// Any failure degrades; anything else short of healthy is a warning.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        let mut overall = Self::Healthy;
        for status in statuses {
            match status {
                HealthStatus::Failed => return Self::Degraded,
                HealthStatus::Slow => overall = Self::Warning,
                HealthStatus::Healthy => {}
            }
        }
        overall
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorHealth {
    pub status: HealthStatus,
    pub latency_ms: u64,
    pub last_check: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub overall: OverallHealth,
    #[serde(default)]
    pub connectors: BTreeMap<ConnectorKind, ConnectorHealth>,
}

impl HealthSnapshot {
    pub fn from_reports(
        reports: &[LivenessReport],
        slow_threshold: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let connectors: BTreeMap<ConnectorKind, ConnectorHealth> = reports
            .iter()
            .map(|report| {
                let health = ConnectorHealth {
                    status: HealthStatus::classify(report, slow_threshold),
                    latency_ms: u64::try_from(report.latency.as_millis()).unwrap_or(u64::MAX),
                    last_check: now,
                    error: report.outcome.as_ref().err().map(ToString::to_string),
                };
                (report.connector, health)
            })
            .collect();

        Self {
            timestamp: now,
            overall: OverallHealth::aggregate(connectors.values().map(|h| h.status)),
            connectors,
        }
    }

    pub fn failed_connectors(&self) -> Vec<ConnectorKind> {
        self.connectors
            .iter()
            .filter(|(_, health)| health.status == HealthStatus::Failed)
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// One-line summary, e.g. `degraded: asana healthy (120ms), github failed`.
    pub fn summary(&self) -> String {
        if self.connectors.is_empty() {
            return format!("{}: no connectors", self.overall);
        }
        let parts: Vec<String> = self
            .connectors
            .iter()
            .map(|(kind, health)| match health.status {
                HealthStatus::Failed => format!("{kind} failed"),
                status => format!("{kind} {status} ({}ms)", health.latency_ms),
            })
            .collect();
        format!("{}: {}", self.overall, parts.join(", "))
    }
}
