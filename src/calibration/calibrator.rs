use super::{CalibrationSnapshot, ConnectorFacts, ConnectorStatus};
use crate::connectors::{ConnectorClient, ConnectorSet, LivenessReport, check_all};
use crate::error::{ConnectorError, PersistenceError};
use crate::store::SnapshotStore;
use chrono::Utc;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Probes every configured connector and records what it learned.
pub struct Calibrator {
    connectors: ConnectorSet,
    store: Arc<dyn SnapshotStore>,
    probe_timeout: Duration,
}

impl Calibrator {
    pub fn new(
        connectors: ConnectorSet,
        store: Arc<dyn SnapshotStore>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            connectors,
            store,
            probe_timeout,
        }
    }

    pub fn connectors(&self) -> &ConnectorSet {
        &self.connectors
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Connector failures become `failed` entries; only persisting the
    /// snapshot can make this return an error.
    pub async fn calibrate(&self) -> Result<CalibrationSnapshot, PersistenceError> {
        let probes = self.connectors.iter().map(|client| async move {
            let status = match probe(client.as_ref(), self.probe_timeout).await {
                Ok(facts) => ConnectorStatus::authenticated(facts, Utc::now()),
                Err(e) => {
                    tracing::warn!(
                        connector = %client.kind(),
                        error = %e,
                        "calibration probe failed"
                    );
                    ConnectorStatus::failed(e.to_string(), Utc::now())
                }
            };
            (client.kind(), status)
        });

        let connectors = join_all(probes).await.into_iter().collect();
        let snapshot = CalibrationSnapshot::new(Utc::now(), connectors);

        self.store.save(&snapshot).await?;
        tracing::info!(
            connectors = snapshot.connectors.len(),
            failed = snapshot.failed_connectors().len(),
            "calibration complete"
        );
        Ok(snapshot)
    }

    /// Liveness of every connector, or `None` when nothing was ever
    /// calibrated. The stored snapshot is left untouched.
    pub async fn verify_report(&self) -> Result<Option<Vec<LivenessReport>>, PersistenceError> {
        if self.store.load().await?.is_none() {
            tracing::info!("no calibration snapshot; skipping verification");
            return Ok(None);
        }
        Ok(Some(check_all(self.connectors.clients(), self.probe_timeout).await))
    }

    pub async fn verify(&self) -> Result<bool, PersistenceError> {
        Ok(self
            .verify_report()
            .await?
            .is_some_and(|reports| reports.iter().all(LivenessReport::is_alive)))
    }
}

async fn probe(
    client: &dyn ConnectorClient,
    timeout: Duration,
) -> Result<ConnectorFacts, ConnectorError> {
    let attempt = async {
        let identity = client.get_identity().await?;
        let containers = client.list_containers().await?;
        Ok::<_, ConnectorError>(client.describe(&identity, &containers))
    };

    tokio::time::timeout(timeout, attempt)
        .await
        .unwrap_or_else(|_| {
            Err(ConnectorError::Timeout {
                connector: client.kind().to_string(),
                timeout_secs: timeout.as_secs(),
            })
        })
}
