use crate::calibration::{CalibrationSnapshot, ConnectorStatus};
use crate::config::Config;
use crate::connectors::LivenessReport;
use crate::health::HealthSnapshot;
use crate::ui::style as ui;
use chrono::Duration;

/// Compact age such as `2d 3h`, `4h 12m`, `35s`.
pub fn format_age(age: Duration) -> String {
    let secs = age.num_seconds().max(0);
    let (days, hours, mins) = (secs / 86_400, (secs % 86_400) / 3_600, (secs % 3_600) / 60);
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else if mins > 0 {
        format!("{mins}m {}s", secs % 60)
    } else {
        format!("{secs}s")
    }
}

fn identity_line(status: &ConnectorStatus) -> String {
    let who = match (&status.user, &status.bot) {
        (Some(user), _) => match &user.login {
            Some(login) => format!("{} (@{login})", user.name),
            None => user.name.clone(),
        },
        (None, Some(bot)) => format!("{} [bot, {}]", bot.name, bot.owner),
        (None, None) => String::from("-"),
    };
    let scope = status
        .workspace
        .as_ref()
        .or(status.team.as_ref())
        .map(|container| match &container.key {
            Some(key) => format!("{} [{key}]", container.name),
            None => container.name.clone(),
        });

    match scope {
        Some(scope) => format!("{who} in {scope}"),
        None => who,
    }
}

pub fn render_calibration(snapshot: &CalibrationSnapshot) -> String {
    let mut lines = vec![
        format!("◆ {}", ui::header("Calibration")),
        ui::dim(format!("  taken {}", snapshot.timestamp.to_rfc3339())),
        String::new(),
    ];

    if snapshot.connectors.is_empty() {
        lines.push("  no connectors configured".to_string());
    }
    for (kind, status) in &snapshot.connectors {
        let detail = match &status.error {
            Some(error) => error.clone(),
            None => identity_line(status),
        };
        lines.push(format!(
            "  {:<8} {:<15} {detail}",
            ui::label(kind),
            ui::calibration_state(status.status)
        ));
    }
    lines.join("\n")
}

pub fn render_liveness(reports: &[LivenessReport]) -> String {
    let mut lines = vec![format!("◆ {}", ui::header("Verification")), String::new()];
    for report in reports {
        let verdict = match &report.outcome {
            Ok(()) => format!("{} {}ms", ui::ok("alive"), report.latency.as_millis()),
            Err(e) => format!("{} {e}", ui::fail("failed")),
        };
        lines.push(format!("  {:<8} {verdict}", ui::label(report.connector)));
    }
    lines.join("\n")
}

pub fn render_status(
    config: &Config,
    snapshot: &CalibrationSnapshot,
    age: Duration,
    needs_refresh: bool,
) -> String {
    let refresh = if needs_refresh {
        ui::warn(format!(
            "refresh due (older than {}h)",
            config.calibration.max_age_hours
        ))
    } else {
        ui::ok("fresh")
    };

    let mut lines = vec![
        format!("◆ {}", ui::header("Waypoint status")),
        String::new(),
        format!("  version    {}", env!("CARGO_PKG_VERSION")),
        format!("  config     {}", config.config_path.display()),
        format!("  state      {}", config.state_dir_path().display()),
        format!(
            "  snapshot   v{}, {} old, {refresh}",
            snapshot.version,
            format_age(age)
        ),
        String::new(),
    ];
    lines.push(render_calibration(snapshot));
    lines.join("\n")
}

pub fn render_health(health: &HealthSnapshot) -> String {
    let mut lines = vec![
        format!(
            "◆ {} {}",
            ui::header("Health"),
            ui::overall_health(health.overall)
        ),
        ui::dim(format!("  checked {}", health.timestamp.to_rfc3339())),
        String::new(),
    ];
    for (kind, connector) in &health.connectors {
        let mut line = format!(
            "  {:<8} {:<10} {}ms",
            ui::label(kind),
            ui::health_status(connector.status),
            connector.latency_ms
        );
        if let Some(error) = &connector.error {
            line.push_str(&format!("  {}", ui::dim(error)));
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{ConnectorFacts, ContainerFacts, UserFacts};
    use crate::connectors::ConnectorKind;
    use chrono::Utc;
    use std::collections::BTreeMap;

    #[test]
    fn age_formatting() {
        assert_eq!(format_age(Duration::seconds(35)), "35s");
        assert_eq!(format_age(Duration::seconds(125)), "2m 5s");
        assert_eq!(format_age(Duration::minutes(252)), "4h 12m");
        assert_eq!(format_age(Duration::hours(51)), "2d 3h");
        assert_eq!(format_age(Duration::seconds(-4)), "0s");
    }

    #[test]
    fn calibration_render_shows_identity_and_errors() {
        let now = Utc::now();
        let mut connectors = BTreeMap::new();
        connectors.insert(
            ConnectorKind::Linear,
            ConnectorStatus::authenticated(
                ConnectorFacts {
                    user: Some(UserFacts {
                        id: "u-1".into(),
                        name: "Grace Hopper".into(),
                        email: None,
                        login: Some("grace".into()),
                    }),
                    team: Some(ContainerFacts {
                        id: "t-1".into(),
                        name: "Platform".into(),
                        key: Some("PLT".into()),
                    }),
                    ..ConnectorFacts::default()
                },
                now,
            ),
        );
        connectors.insert(
            ConnectorKind::Github,
            ConnectorStatus::failed("github authentication failed: Bad credentials", now),
        );

        let rendered = render_calibration(&CalibrationSnapshot::new(now, connectors));
        assert!(rendered.contains("Grace Hopper (@grace) in Platform [PLT]"));
        assert!(rendered.contains("Bad credentials"));
    }
}
