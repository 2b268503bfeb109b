use crate::connectors::ConnectorKind;
use serde::{Deserialize, Serialize};

/// Credentials and endpoint for one connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub token: String,
    /// Overrides the provider's public API root (self-hosted, proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ConnectorConfig {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: None,
        }
    }
}

/// A connector is configured iff its table is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorsConfig {
    #[serde(default)]
    pub asana: Option<ConnectorConfig>,
    #[serde(default)]
    pub linear: Option<ConnectorConfig>,
    #[serde(default)]
    pub github: Option<ConnectorConfig>,
    #[serde(default)]
    pub notion: Option<ConnectorConfig>,
}

impl ConnectorsConfig {
    pub fn get(&self, kind: ConnectorKind) -> Option<&ConnectorConfig> {
        match kind {
            ConnectorKind::Asana => self.asana.as_ref(),
            ConnectorKind::Linear => self.linear.as_ref(),
            ConnectorKind::Github => self.github.as_ref(),
            ConnectorKind::Notion => self.notion.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, kind: ConnectorKind) -> &mut Option<ConnectorConfig> {
        match kind {
            ConnectorKind::Asana => &mut self.asana,
            ConnectorKind::Linear => &mut self.linear,
            ConnectorKind::Github => &mut self.github,
            ConnectorKind::Notion => &mut self.notion,
        }
    }

    /// Configured connectors in declaration order.
    pub fn configured(&self) -> Vec<(ConnectorKind, &ConnectorConfig)> {
        ConnectorKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|cfg| (kind, cfg)))
            .collect()
    }
}
