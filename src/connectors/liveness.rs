use super::{ConnectorClient, ConnectorKind};
use crate::error::ConnectorError;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of one identity ping, with its wall-clock latency.
#[derive(Debug, Clone)]
pub struct LivenessReport {
    pub connector: ConnectorKind,
    pub latency: Duration,
    pub outcome: Result<(), ConnectorError>,
}

impl LivenessReport {
    pub fn is_alive(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Pings one connector. Exceeding `timeout` is reported as a failure, never
/// as a hang.
pub async fn check_liveness(client: &dyn ConnectorClient, timeout: Duration) -> LivenessReport {
    let connector = client.kind();
    let started = Instant::now();
    let outcome = match tokio::time::timeout(timeout, client.ping_identity()).await {
        Ok(result) => result,
        Err(_) => Err(ConnectorError::Timeout {
            connector: connector.to_string(),
            timeout_secs: timeout.as_secs(),
        }),
    };
    let latency = started.elapsed();

    match &outcome {
        Ok(()) => tracing::debug!(
            connector = %connector,
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            "liveness ok"
        ),
        Err(e) => tracing::warn!(connector = %connector, error = %e, "liveness check failed"),
    }

    LivenessReport {
        connector,
        latency,
        outcome,
    }
}

/// Pings every client concurrently; reports keep the input order.
pub async fn check_all(
    clients: &[Arc<dyn ConnectorClient>],
    timeout: Duration,
) -> Vec<LivenessReport> {
    join_all(
        clients
            .iter()
            .map(|client| check_liveness(client.as_ref(), timeout)),
    )
    .await
}
