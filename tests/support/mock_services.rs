#![allow(dead_code)]

use serde_json::json;
use std::path::Path;
use waypoint::config::{Config, ConnectorConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Asana with one user, two workspaces and a `Roadmap` project in `ws-1`.
pub async fn asana_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"gid": "u-42", "name": "Ada Lovelace", "email": "ada@example.com"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/workspaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"gid": "ws-1", "name": "Acme"}, {"gid": "ws-2", "name": "Personal"}],
            "next_page": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/workspaces/ws-1/typeahead"))
        .and(query_param("resource_type", "project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"gid": "p-7", "name": "Roadmap"}]
        })))
        .mount(&server)
        .await;
    server
}

/// GitHub that rejects every token.
pub async fn github_rejecting_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad credentials",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&server)
        .await;
    server
}

pub fn config_for(state_dir: &Path, asana: &MockServer, github: Option<&MockServer>) -> Config {
    let mut config = Config {
        state_dir: state_dir.display().to_string(),
        ..Config::default()
    };
    config.calibration.probe_timeout_secs = 5;
    config.connectors.asana = Some(ConnectorConfig {
        token: "1/asana-token".into(),
        base_url: Some(asana.uri()),
    });
    if let Some(github) = github {
        config.connectors.github = Some(ConnectorConfig {
            token: "ghp_revoked".into(),
            base_url: Some(github.uri()),
        });
    }
    config
}
