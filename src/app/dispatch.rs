use super::status::{render_calibration, render_health, render_liveness, render_status};
use super::{Outcome, Services};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::connectors::LivenessReport;
use crate::enforcement::ToolCall;
use crate::health::HealthSnapshot;
use crate::store::{SnapshotStore, age_of};
use crate::ui::style as ui;
use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;

fn no_snapshot_hint() {
    println!(
        "{} {}",
        ui::warn("No calibration snapshot stored."),
        ui::dim("Run `waypoint calibrate` first.")
    );
}

fn health_outcome(health: &HealthSnapshot) -> Outcome {
    if health.failed_connectors().is_empty() {
        Outcome::Success
    } else {
        Outcome::ConnectorsFailed
    }
}

/// Parses `--params`; only a JSON object is accepted.
pub fn parse_params(tool: &str, raw: &str) -> Result<ToolCall> {
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("--params is not valid JSON: {raw}"))?;
    anyhow::ensure!(value.is_object(), "--params must be a JSON object");
    Ok(ToolCall::from_value(tool, value))
}

pub async fn dispatch(cli: Cli, config: Arc<Config>) -> Result<Outcome> {
    let services = Services::from_config(config)?;
    run_command(cli.command, services).await
}

pub async fn run_command(command: Commands, services: Services) -> Result<Outcome> {
    match command {
        Commands::Calibrate => {
            let snapshot = services.calibrator.calibrate().await?;
            println!("{}", render_calibration(&snapshot));
            Ok(if snapshot.failed_connectors().is_empty() {
                Outcome::Success
            } else {
                Outcome::ConnectorsFailed
            })
        }

        Commands::Verify => {
            let Some(reports) = services.calibrator.verify_report().await? else {
                no_snapshot_hint();
                return Ok(Outcome::NoSnapshot);
            };
            println!("{}", render_liveness(&reports));
            Ok(if reports.iter().all(LivenessReport::is_alive) {
                Outcome::Success
            } else {
                Outcome::ConnectorsFailed
            })
        }

        Commands::Status => {
            let Some(snapshot) = services.store.load().await? else {
                no_snapshot_hint();
                return Ok(Outcome::NoSnapshot);
            };
            let needs_refresh = services
                .store
                .needs_refresh(services.config.calibration.max_age())
                .await?;
            println!(
                "{}",
                render_status(&services.config, &snapshot, age_of(&snapshot), needs_refresh)
            );
            Ok(Outcome::Success)
        }

        Commands::Health { now } => {
            let health = if now {
                services.health_monitor().check_once().await?
            } else if let Some(stored) = services.store.load_health().await? {
                stored
            } else {
                println!(
                    "{} {}",
                    ui::warn("No health snapshot stored."),
                    ui::dim("Run `waypoint health --now` or `waypoint monitor`.")
                );
                return Ok(Outcome::NoSnapshot);
            };
            println!("{}", render_health(&health));
            Ok(health_outcome(&health))
        }

        Commands::Enforce { tool, params } => {
            let call = parse_params(&tool, &params)?;
            let enforcer = services.enforcer();
            if !enforcer.load_snapshot(services.store.as_ref()).await? {
                tracing::warn!("no calibration snapshot; identifiers will not be injected");
            }
            let result = enforcer.enforce(call).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(Outcome::Success)
        }

        Commands::Monitor => {
            super::daemon::run(services).await?;
            Ok(Outcome::Success)
        }
    }
}
