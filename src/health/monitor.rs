use super::alert::{AlertSink, HealthAlert};
use super::{HealthSnapshot, OverallHealth};
use crate::config::MonitorConfig;
use crate::connectors::{ConnectorSet, check_all};
use crate::error::PersistenceError;
use crate::store::SnapshotStore;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

struct MonitorInner {
    connectors: ConnectorSet,
    store: Arc<dyn SnapshotStore>,
    alerts: Arc<dyn AlertSink>,
    interval: Duration,
    probe_timeout: Duration,
    slow_threshold: Duration,
    cycles: AtomicU64,
}

impl MonitorInner {
    async fn run_cycle(&self) -> Result<HealthSnapshot, PersistenceError> {
        let reports = check_all(self.connectors.clients(), self.probe_timeout).await;
        let snapshot = HealthSnapshot::from_reports(&reports, self.slow_threshold, Utc::now());

        if snapshot.overall == OverallHealth::Healthy {
            tracing::info!("health: {}", snapshot.summary());
        } else {
            tracing::warn!("health: {}", snapshot.summary());
            self.dispatch_alert(HealthAlert::from_snapshot(&snapshot));
        }

        self.cycles.fetch_add(1, Ordering::SeqCst);
        self.store.save_health(&snapshot).await?;
        Ok(snapshot)
    }

    /// Delivery runs detached so a slow or failing sink never holds up a cycle.
    fn dispatch_alert(&self, alert: HealthAlert) {
        let sink = Arc::clone(&self.alerts);
        tokio::spawn(async move {
            if let Err(e) = sink.send(&alert).await {
                tracing::warn!(sink = sink.name(), error = %e, "health alert delivery failed");
            }
        });
    }
}

struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Idle until [`HealthMonitor::start`]; then one cycle immediately and one
/// per interval until [`HealthMonitor::stop`].
pub struct HealthMonitor {
    inner: Arc<MonitorInner>,
    handle: Mutex<Option<MonitorHandle>>,
}

impl HealthMonitor {
    pub fn new(
        connectors: ConnectorSet,
        store: Arc<dyn SnapshotStore>,
        alerts: Arc<dyn AlertSink>,
        config: &MonitorConfig,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                connectors,
                store,
                alerts,
                interval: Duration::from_secs(config.interval_secs.max(1)),
                probe_timeout,
                slow_threshold: Duration::from_millis(config.slow_threshold_ms),
                cycles: AtomicU64::new(0),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Returns `false` when already monitoring; no second schedule is created.
    pub async fn start(&self) -> bool {
        let mut guard = self.handle.lock().await;
        if guard.as_ref().is_some_and(|handle| !handle.task.is_finished()) {
            tracing::debug!("health monitor already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_schedule(Arc::clone(&self.inner), cancel.clone()));
        *guard = Some(MonitorHandle { cancel, task });
        tracing::info!(
            interval_secs = self.inner.interval.as_secs(),
            connectors = self.inner.connectors.len(),
            "health monitor started"
        );
        true
    }

    /// Waits for an in-flight cycle to finish; none starts afterwards.
    pub async fn stop(&self) {
        let Some(handle) = self.handle.lock().await.take() else {
            return;
        };
        handle.cancel.cancel();
        if let Err(e) = handle.task.await {
            tracing::warn!(error = %e, "health monitor task ended abnormally");
        }
        tracing::info!("health monitor stopped");
    }

    pub async fn is_monitoring(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.task.is_finished())
    }

    pub fn cycle_count(&self) -> u64 {
        self.inner.cycles.load(Ordering::SeqCst)
    }

    /// One cycle outside the schedule.
    pub async fn check_once(&self) -> Result<HealthSnapshot, PersistenceError> {
        self.inner.run_cycle().await
    }
}

async fn run_schedule(inner: Arc<MonitorInner>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(inner.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if let Err(e) = inner.run_cycle().await {
            tracing::error!(error = %e, "failed to persist health snapshot");
        }
    }
}
