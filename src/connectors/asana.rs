//! Asana REST adapter. Workspaces are the containers; the first workspace
//! scopes `workspace`-parameterized calls.

use super::http_client::{read_json, transport_error};
use super::{
    Container, ConnectorClient, ConnectorKind, Identity, NameField, Page, Resolution,
    ScopeContext, collect_pages, find_by_name,
};
use crate::calibration::{ConnectorFacts, ConnectorStats, ContainerFacts, UserFacts};
use crate::error::ConnectorError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const ASANA_API_BASE: &str = "https://app.asana.com/api/1.0";
const PAGE_LIMIT: &str = "100";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde(default)]
    next_page: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    offset: String,
}

#[derive(Debug, Deserialize)]
struct AsanaUser {
    gid: String,
    name: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AsanaCompact {
    gid: String,
    name: String,
}

impl From<AsanaCompact> for Container {
    fn from(item: AsanaCompact) -> Self {
        Container::new(item.gid, item.name)
    }
}

pub struct AsanaClient {
    token: String,
    base_url: String,
    client: Client,
    max_pages: u32,
}

impl AsanaClient {
    pub fn new(token: &str, base_url: Option<&str>, client: Client, max_pages: u32) -> Self {
        Self {
            token: token.to_string(),
            base_url: base_url
                .unwrap_or(ASANA_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            client,
            max_pages,
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>, ConnectorError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(ConnectorKind::Asana, &e))?;
        read_json(ConnectorKind::Asana, response).await
    }

    /// Offset-paginated listing converted into normalized pages.
    async fn list_paged(&self, path: &str) -> Result<Vec<AsanaCompact>, ConnectorError> {
        collect_pages(ConnectorKind::Asana, self.max_pages, |offset| async move {
            let mut query = vec![("limit", PAGE_LIMIT)];
            if let Some(offset) = offset.as_deref() {
                query.push(("offset", offset));
            }
            let envelope: Envelope<Vec<AsanaCompact>> = self.get(path, &query).await?;
            Ok(Page {
                items: envelope.data,
                next_cursor: envelope.next_page.map(|next| next.offset),
            })
        })
        .await
    }

    async fn typeahead_projects(
        &self,
        workspace: &str,
        name: &str,
    ) -> Result<Vec<AsanaCompact>, ConnectorError> {
        let envelope: Envelope<Vec<AsanaCompact>> = self
            .get(
                &format!("/workspaces/{workspace}/typeahead"),
                &[("resource_type", "project"), ("query", name), ("count", "20")],
            )
            .await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl ConnectorClient for AsanaClient {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Asana
    }

    async fn get_identity(&self) -> Result<Identity, ConnectorError> {
        let envelope: Envelope<AsanaUser> = self.get("/users/me", &[]).await?;
        let user = envelope.data;
        Ok(Identity {
            email: user.email,
            ..Identity::new(user.gid, user.name)
        })
    }

    async fn list_containers(&self) -> Result<Vec<Container>, ConnectorError> {
        let workspaces = self.list_paged("/workspaces").await?;
        Ok(workspaces.into_iter().map(Container::from).collect())
    }

    async fn resolve_id_by_name(
        &self,
        scope: &ScopeContext,
        field: NameField,
        name: &str,
    ) -> Result<Resolution, ConnectorError> {
        let Some(workspace) = scope.scope_id.as_deref() else {
            return Ok(Resolution::NotFound);
        };

        let (key, candidates) = match field {
            NameField::Name => ("gid", self.typeahead_projects(workspace, name).await?),
            NameField::ProjectName => (
                "projectId",
                self.typeahead_projects(workspace, name).await?,
            ),
            NameField::TeamName => (
                "teamId",
                self.list_paged(&format!("/organizations/{workspace}/teams"))
                    .await?,
            ),
        };

        Ok(find_by_name(&candidates, name, |item| &item.name)
            .map_or(Resolution::NotFound, |item| Resolution::single(key, &item.gid)))
    }

    fn describe(&self, identity: &Identity, containers: &[Container]) -> ConnectorFacts {
        ConnectorFacts {
            user: Some(UserFacts {
                id: identity.id.clone(),
                name: identity.display_name.clone(),
                email: identity.email.clone(),
                login: None,
            }),
            workspace: containers.first().map(|ws| ContainerFacts {
                id: ws.id.clone(),
                name: ws.display_name.clone(),
                key: None,
            }),
            team: None,
            stats: Some(ConnectorStats {
                container_kind: "workspaces".into(),
                containers: containers.len(),
            }),
            bot: None,
        }
    }
}
