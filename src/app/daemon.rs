use super::Services;
use crate::calibration::{CalibrationSnapshot, Calibrator};
use crate::config::CalibrationConfig;
use crate::error::PersistenceError;
use crate::store::SnapshotStore;
use crate::ui::style as ui;
use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};

/// Calibrates when configured to on every start, or when the stored
/// snapshot is missing or stale.
pub async fn calibrate_if_due(
    calibrator: &Calibrator,
    config: &CalibrationConfig,
) -> Result<Option<CalibrationSnapshot>, PersistenceError> {
    let due = config.auto_run_on_start
        || calibrator.store().needs_refresh(config.max_age()).await?;
    if !due {
        tracing::info!("stored calibration is fresh; skipping startup calibration");
        return Ok(None);
    }
    calibrator.calibrate().await.map(Some)
}

/// Returns `true` when verification failed and a recalibration ran.
pub async fn verify_or_recalibrate(calibrator: &Calibrator) -> Result<bool, PersistenceError> {
    if calibrator.verify().await? {
        tracing::debug!("periodic verification passed");
        return Ok(false);
    }
    tracing::warn!("verification failed; recalibrating");
    calibrator.calibrate().await?;
    Ok(true)
}

fn spawn_verifier(services: Arc<Services>) -> JoinHandle<()> {
    let period = Duration::from_secs(services.config.calibration.verify_interval_secs.max(1));
    tokio::spawn(async move {
        // Startup already calibrated or found a fresh snapshot.
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = verify_or_recalibrate(&services.calibrator).await {
                tracing::error!(error = %e, "periodic verification failed to persist");
            }
        }
    })
}

pub async fn run(services: Services) -> Result<()> {
    let services = Arc::new(services);

    if let Some(snapshot) =
        calibrate_if_due(&services.calibrator, &services.config.calibration).await?
    {
        println!("{}", super::status::render_calibration(&snapshot));
    }

    let monitor = services.health_monitor();
    monitor.start().await;
    let verifier = spawn_verifier(Arc::clone(&services));

    println!();
    println!("◆ {}", ui::header("Waypoint monitor running"));
    println!(
        "   {}",
        ui::dim(format!(
            "health every {}s, verification every {}s",
            services.config.monitor.interval_secs, services.config.calibration.verify_interval_secs
        ))
    );
    println!("   {}", ui::dim("Ctrl-C to stop"));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    verifier.abort();
    let _ = verifier.await;
    monitor.stop().await;
    Ok(())
}
