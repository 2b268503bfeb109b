use waypoint::config::Config;
use waypoint::connectors::ConnectorKind;

#[test]
fn minimal_config_deserializes_with_defaults() {
    let toml = r#"
[connectors.linear]
token = "lin_api_x"
"#;

    let parsed: Config = toml::from_str(toml).expect("minimal config should deserialize");

    assert_eq!(parsed.state_dir, "~/.waypoint/state");
    assert!(parsed.calibration.auto_run_on_start);
    assert_eq!(parsed.calibration.max_age_hours, 24);
    assert_eq!(parsed.monitor.interval_secs, 300);
    assert!(parsed.enforcement.require_complete_pagination);
    assert!(parsed.enforcement.auto_resolve_ids);
    assert_eq!(parsed.enforcement.max_chain_depth, 5);
    assert!(parsed.monitor.alert_webhook_url.is_none());
    assert!(parsed.validate().is_ok());
}

#[test]
fn connector_tables_select_connectors() {
    let toml = r#"
state_dir = "/var/lib/waypoint"

[connectors.notion]
token = "secret_n"

[connectors.github]
token = "ghp_x"
base_url = "https://github.example.com/api/v3"

[monitor]
interval_secs = 60
slow_threshold_ms = 500
"#;

    let parsed: Config = toml::from_str(toml).expect("connector config should deserialize");
    let kinds: Vec<ConnectorKind> = parsed
        .connectors
        .configured()
        .into_iter()
        .map(|(kind, _)| kind)
        .collect();

    assert_eq!(kinds, vec![ConnectorKind::Github, ConnectorKind::Notion]);
    assert_eq!(parsed.monitor.slow_threshold_ms, 500);
    assert!(parsed.connectors.asana.is_none());
}

#[test]
fn invalid_webhook_url_fails_validation() {
    let toml = r#"
[connectors.asana]
token = "1/abc"

[monitor]
alert_webhook_url = "not a url"
"#;

    let parsed: Config = toml::from_str(toml).unwrap();
    let err = parsed.validate().unwrap_err();
    assert!(err.to_string().contains("alert_webhook_url"));
}
