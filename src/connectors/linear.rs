//! Linear GraphQL adapter. Teams are the containers; the first team scopes
//! `teamId`-parameterized calls.

use super::http_client::{classify_status, malformed, transport_error};
use super::{
    Container, ConnectorClient, ConnectorKind, Identity, NameField, Page, Resolution,
    ScopeContext, collect_pages, find_by_name,
};
use crate::calibration::{ConnectorFacts, ConnectorStats, ContainerFacts, UserFacts};
use crate::error::ConnectorError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

const LINEAR_API_BASE: &str = "https://api.linear.app";

const VIEWER_QUERY: &str = "query Viewer { viewer { id name displayName email } }";

const TEAMS_QUERY: &str = "query Teams($after: String) { \
    teams(first: 50, after: $after) { \
        nodes { id name key } \
        pageInfo { hasNextPage endCursor } \
    } \
}";

const PROJECTS_BY_NAME_QUERY: &str = "query ProjectsByName($name: String!) { \
    projects(first: 10, filter: { name: { eqIgnoreCase: $name } }) { \
        nodes { id name } \
    } \
}";

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphqlError {
    fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: LinearUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinearUser {
    id: String,
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
    #[serde(rename = "pageInfo", default)]
    page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    #[serde(default)]
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamsData {
    teams: Connection<LinearTeam>,
}

#[derive(Debug, Deserialize)]
struct LinearTeam {
    id: String,
    name: String,
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectsData {
    projects: Connection<LinearProject>,
}

#[derive(Debug, Deserialize)]
struct LinearProject {
    id: String,
    name: String,
}

fn graphql_error(errors: &[GraphqlError]) -> ConnectorError {
    let connector = ConnectorKind::Linear.to_string();
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    match errors.iter().find_map(GraphqlError::code) {
        Some("AUTHENTICATION_ERROR" | "FORBIDDEN") => ConnectorError::Auth { connector, message },
        Some("RATELIMITED") => ConnectorError::RateLimited {
            connector,
            retry_after_secs: None,
        },
        _ => ConnectorError::Malformed { connector, message },
    }
}

pub struct LinearClient {
    token: String,
    endpoint: String,
    client: Client,
    max_pages: u32,
}

impl LinearClient {
    pub fn new(token: &str, base_url: Option<&str>, client: Client, max_pages: u32) -> Self {
        let base = base_url.unwrap_or(LINEAR_API_BASE).trim_end_matches('/');
        Self {
            token: token.to_string(),
            endpoint: format!("{base}/graphql"),
            client,
            max_pages,
        }
    }

    /// Linear reports most failures as GraphQL `errors`, sometimes with a
    /// 400 status, so the envelope is inspected before the HTTP status.
    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ConnectorError> {
        let kind = ConnectorKind::Linear;
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| transport_error(kind, &e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(kind, &e))?;

        if let Ok(envelope) = serde_json::from_str::<GraphqlEnvelope<T>>(&body) {
            if !envelope.errors.is_empty() {
                return Err(graphql_error(&envelope.errors));
            }
            if status.is_success()
                && let Some(data) = envelope.data
            {
                return Ok(data);
            }
        }

        if let Some(error) = classify_status(kind, status, &headers, &body) {
            return Err(error);
        }
        Err(malformed(kind, "response carried neither data nor errors"))
    }

    async fn teams(&self) -> Result<Vec<LinearTeam>, ConnectorError> {
        collect_pages(ConnectorKind::Linear, self.max_pages, |after| async move {
            let data: TeamsData = self.query(TEAMS_QUERY, json!({ "after": after })).await?;
            let next_cursor = data
                .teams
                .page_info
                .filter(|info| info.has_next_page)
                .and_then(|info| info.end_cursor);
            Ok(Page {
                items: data.teams.nodes,
                next_cursor,
            })
        })
        .await
    }
}

#[async_trait]
impl ConnectorClient for LinearClient {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Linear
    }

    async fn get_identity(&self) -> Result<Identity, ConnectorError> {
        let data: ViewerData = self.query(VIEWER_QUERY, json!({})).await?;
        let viewer = data.viewer;
        Ok(Identity {
            email: viewer.email,
            login: viewer.display_name,
            ..Identity::new(viewer.id, viewer.name)
        })
    }

    async fn list_containers(&self) -> Result<Vec<Container>, ConnectorError> {
        let teams = self.teams().await?;
        Ok(teams
            .into_iter()
            .map(|team| Container {
                key: team.key,
                ..Container::new(team.id, team.name)
            })
            .collect())
    }

    async fn resolve_id_by_name(
        &self,
        _scope: &ScopeContext,
        field: NameField,
        name: &str,
    ) -> Result<Resolution, ConnectorError> {
        if field == NameField::TeamName {
            let teams = self.teams().await?;
            return Ok(find_by_name(&teams, name, |team| &team.name)
                .map_or(Resolution::NotFound, |team| {
                    Resolution::single("teamId", &team.id)
                }));
        }

        let data: ProjectsData = self
            .query(PROJECTS_BY_NAME_QUERY, json!({ "name": name.trim() }))
            .await?;
        let key = if field == NameField::ProjectName {
            "projectId"
        } else {
            "id"
        };
        Ok(find_by_name(&data.projects.nodes, name, |p| &p.name)
            .map_or(Resolution::NotFound, |project| {
                Resolution::single(key, &project.id)
            }))
    }

    fn describe(&self, identity: &Identity, containers: &[Container]) -> ConnectorFacts {
        ConnectorFacts {
            user: Some(UserFacts {
                id: identity.id.clone(),
                name: identity.display_name.clone(),
                email: identity.email.clone(),
                login: identity.login.clone(),
            }),
            workspace: None,
            team: containers.first().map(|team| ContainerFacts {
                id: team.id.clone(),
                name: team.display_name.clone(),
                key: team.key.clone(),
            }),
            stats: Some(ConnectorStats {
                container_kind: "teams".into(),
                containers: containers.len(),
            }),
            bot: None,
        }
    }
}
