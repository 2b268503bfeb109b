use super::asana::AsanaClient;
use super::github::GithubClient;
use super::http_client::build_connector_client_with_timeout;
use super::linear::LinearClient;
use super::notion::NotionClient;
use super::{ConnectorClient, ConnectorKind, ConnectorSet};
use crate::config::{Config, ConnectorConfig};
use reqwest::Client;
use std::sync::Arc;

fn create_connector(
    kind: ConnectorKind,
    config: &ConnectorConfig,
    client: Client,
    max_pages: u32,
) -> Arc<dyn ConnectorClient> {
    let token = config.token.trim();
    let base_url = config.base_url.as_deref();
    match kind {
        ConnectorKind::Asana => Arc::new(AsanaClient::new(token, base_url, client, max_pages)),
        ConnectorKind::Linear => Arc::new(LinearClient::new(token, base_url, client, max_pages)),
        ConnectorKind::Github => Arc::new(GithubClient::new(token, base_url, client, max_pages)),
        ConnectorKind::Notion => Arc::new(NotionClient::new(token, base_url, client, max_pages)),
    }
}

/// Builds one client per configured connector, sharing a connection pool.
pub fn create_connectors(config: &Config) -> ConnectorSet {
    let http = build_connector_client_with_timeout(config.calibration.probe_timeout_secs);
    let max_pages = config.enforcement.max_pagination_pages;

    ConnectorSet::new(
        config
            .connectors
            .configured()
            .into_iter()
            .map(|(kind, connector)| create_connector(kind, connector, http.clone(), max_pages))
            .collect(),
    )
}
