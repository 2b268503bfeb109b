use std::sync::Arc;

use tempfile::TempDir;

use crate::mock_services::{asana_server, config_for, github_rejecting_server};
use waypoint::app::Services;
use waypoint::calibration::CalibrationState;
use waypoint::connectors::ConnectorKind;
use waypoint::health::{HealthStatus, OverallHealth};
use waypoint::store::{CALIBRATION_EXPORT_FILE, CALIBRATION_FILE, SnapshotStore};

#[tokio::test]
async fn calibration_persists_identity_and_scope() {
    let asana = asana_server().await;
    let state = TempDir::new().unwrap();
    let services =
        Services::from_config(Arc::new(config_for(state.path(), &asana, None))).unwrap();

    let snapshot = services.calibrator.calibrate().await.unwrap();

    let status = snapshot.get(ConnectorKind::Asana).unwrap();
    assert_eq!(status.status, CalibrationState::Authenticated);
    assert_eq!(status.user.as_ref().unwrap().name, "Ada Lovelace");
    assert_eq!(status.workspace.as_ref().unwrap().id, "ws-1");
    assert_eq!(status.stats.as_ref().unwrap().containers, 2);

    assert!(state.path().join(CALIBRATION_FILE).exists());
    assert!(state.path().join(CALIBRATION_EXPORT_FILE).exists());
    assert_eq!(services.store.load().await.unwrap(), Some(snapshot));
}

#[tokio::test]
async fn rejected_connector_does_not_block_the_rest() {
    let asana = asana_server().await;
    let github = github_rejecting_server().await;
    let state = TempDir::new().unwrap();
    let services = Services::from_config(Arc::new(config_for(
        state.path(),
        &asana,
        Some(&github),
    )))
    .unwrap();

    let snapshot = services.calibrator.calibrate().await.unwrap();

    assert_eq!(snapshot.failed_connectors(), vec![ConnectorKind::Github]);
    let github_status = snapshot.get(ConnectorKind::Github).unwrap();
    assert!(github_status.user.is_none());
    assert!(github_status.error.as_deref().unwrap().contains("Bad credentials"));
    assert!(snapshot.get(ConnectorKind::Asana).unwrap().is_authenticated());

    assert!(!services.calibrator.verify().await.unwrap());
}

#[tokio::test]
async fn verify_requires_a_stored_snapshot() {
    let asana = asana_server().await;
    let state = TempDir::new().unwrap();
    let services =
        Services::from_config(Arc::new(config_for(state.path(), &asana, None))).unwrap();

    assert!(!services.calibrator.verify().await.unwrap());
    services.calibrator.calibrate().await.unwrap();
    assert!(services.calibrator.verify().await.unwrap());
}

#[tokio::test]
async fn health_check_records_failed_connector() {
    let asana = asana_server().await;
    let github = github_rejecting_server().await;
    let state = TempDir::new().unwrap();
    let services = Services::from_config(Arc::new(config_for(
        state.path(),
        &asana,
        Some(&github),
    )))
    .unwrap();

    let health = services.health_monitor().check_once().await.unwrap();

    assert_eq!(health.overall, OverallHealth::Degraded);
    assert_eq!(health.connectors[&ConnectorKind::Asana].status, HealthStatus::Healthy);
    assert_eq!(health.connectors[&ConnectorKind::Github].status, HealthStatus::Failed);
    assert_eq!(services.store.load_health().await.unwrap(), Some(health));
}
