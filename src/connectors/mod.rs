//! Connector clients for the external task/collaboration services.
//!
//! Every service is reached through [`ConnectorClient`]. Provider field
//! mapping (`describe`), pagination conventions, and name lookup live in
//! the per-service adapter; the calibrator, monitor and enforcement
//! pipeline only ever see the normalized shapes defined here.

pub mod asana;
pub mod factory;
#[cfg(test)]
pub(crate) mod fake;
pub mod github;
pub mod http_client;
pub mod linear;
pub mod liveness;
pub mod notion;
pub mod pagination;

use crate::calibration::ConnectorFacts;
use crate::error::ConnectorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub use factory::create_connectors;
pub use liveness::{LivenessReport, check_all, check_liveness};
pub use pagination::{Page, collect_pages};

/// The fixed set of supported services, in declaration order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectorKind {
    Asana,
    Linear,
    Github,
    Notion,
}

impl ConnectorKind {
    pub const ALL: [Self; 4] = [Self::Asana, Self::Linear, Self::Github, Self::Notion];

    /// Connector owning a tool name such as `asana.list_tasks`.
    pub fn from_tool(tool: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| tool.starts_with(kind.as_ref()))
    }

    /// Parameter through which calls to this connector are scoped.
    pub fn scope_param(self) -> &'static str {
        match self {
            Self::Asana => "workspace",
            Self::Linear => "teamId",
            Self::Github => "owner",
            Self::Notion => "workspace_id",
        }
    }
}

/// Result of the "who am I" call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    /// Handle used in URLs and owner parameters (GitHub login).
    pub login: Option<String>,
    pub bot: Option<BotIdentity>,
}

impl Identity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: None,
            login: None,
            bot: None,
        }
    }
}

/// Integration identities (Notion bots) carry their installation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub owner: String,
    pub workspace_id: Option<String>,
    pub workspace_name: Option<String>,
}

/// A top-level container: workspace, team or organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub display_name: String,
    pub key: Option<String>,
}

impl Container {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            key: None,
        }
    }
}

/// Human-readable parameters the enforcement pipeline can turn into ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum NameField {
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "teamName")]
    TeamName,
    #[strum(serialize = "projectName")]
    ProjectName,
}

impl NameField {
    pub const ALL: [Self; 3] = [Self::Name, Self::TeamName, Self::ProjectName];

    pub fn param(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::TeamName => "teamName",
            Self::ProjectName => "projectName",
        }
    }

    /// Any of these being present means the name needs no resolution.
    pub fn id_params(self) -> &'static [&'static str] {
        match self {
            Self::Name => &["id", "gid"],
            Self::TeamName => &["teamId"],
            Self::ProjectName => &["projectId"],
        }
    }
}

/// Scope a lookup runs in, usually the value of the connector's scope param.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeContext {
    pub scope_id: Option<String>,
}

/// Outcome of a name lookup. A miss is a value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Map<String, Value>),
    NotFound,
}

impl Resolution {
    pub fn single(key: &str, id: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(key.to_string(), Value::String(id.into()));
        Self::Resolved(fields)
    }
}

/// Capability-typed client for one external service.
#[async_trait]
pub trait ConnectorClient: Send + Sync {
    fn kind(&self) -> ConnectorKind;

    async fn get_identity(&self) -> Result<Identity, ConnectorError>;

    /// Top-level containers in provider order; the first one is the default.
    async fn list_containers(&self) -> Result<Vec<Container>, ConnectorError>;

    /// Cheapest authenticated round-trip, used for liveness checks.
    async fn ping_identity(&self) -> Result<(), ConnectorError> {
        self.get_identity().await.map(|_| ())
    }

    async fn resolve_id_by_name(
        &self,
        _scope: &ScopeContext,
        _field: NameField,
        _name: &str,
    ) -> Result<Resolution, ConnectorError> {
        Ok(Resolution::NotFound)
    }

    /// Maps provider-native identity and containers onto snapshot facts.
    fn describe(&self, identity: &Identity, containers: &[Container]) -> ConnectorFacts;
}

/// Lookup capability consumed by the enforcement pipeline.
#[async_trait]
pub trait IdResolver: Send + Sync {
    async fn resolve_id_by_name(
        &self,
        connector: ConnectorKind,
        scope: &ScopeContext,
        field: NameField,
        name: &str,
    ) -> Result<Resolution, ConnectorError>;
}

/// The configured connectors, kept in declaration order.
#[derive(Clone, Default)]
pub struct ConnectorSet {
    clients: Vec<Arc<dyn ConnectorClient>>,
}

impl ConnectorSet {
    pub fn new(mut clients: Vec<Arc<dyn ConnectorClient>>) -> Self {
        clients.sort_by_key(|client| client.kind());
        clients.dedup_by_key(|client| client.kind());
        Self { clients }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ConnectorClient>> {
        self.clients.iter()
    }

    pub fn clients(&self) -> &[Arc<dyn ConnectorClient>] {
        &self.clients
    }

    pub fn get(&self, kind: ConnectorKind) -> Option<&Arc<dyn ConnectorClient>> {
        self.clients.iter().find(|client| client.kind() == kind)
    }

    pub fn kinds(&self) -> Vec<ConnectorKind> {
        self.clients.iter().map(|client| client.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for ConnectorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

#[async_trait]
impl IdResolver for ConnectorSet {
    async fn resolve_id_by_name(
        &self,
        connector: ConnectorKind,
        scope: &ScopeContext,
        field: NameField,
        name: &str,
    ) -> Result<Resolution, ConnectorError> {
        match self.get(connector) {
            Some(client) => client.resolve_id_by_name(scope, field, name).await,
            None => Ok(Resolution::NotFound),
        }
    }
}

/// First item whose name equals `wanted`, ignoring case and outer whitespace.
pub(crate) fn find_by_name<'a, T>(
    items: &'a [T],
    wanted: &str,
    name_of: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    let wanted = wanted.trim();
    items
        .iter()
        .find(|item| name_of(item).trim().eq_ignore_ascii_case(wanted))
}
