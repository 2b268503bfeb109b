//! GitHub REST adapter. The authenticated login scopes `owner`-parameterized
//! calls; organizations are listed as containers.

use super::http_client::{read_json_with_headers, transport_error};
use super::{
    Container, ConnectorClient, ConnectorKind, Identity, NameField, Page, Resolution,
    ScopeContext, collect_pages, find_by_name,
};
use crate::calibration::{ConnectorFacts, ConnectorStats, ContainerFacts, UserFacts};
use crate::error::ConnectorError;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, LINK};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: u64,
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubOrg {
    id: u64,
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubTeam {
    id: u64,
    name: String,
    slug: String,
}

/// Extracts the `rel="next"` target from an RFC 8288 `Link` header.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        is_next.then(|| {
            target
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}

pub struct GithubClient {
    token: String,
    base_url: String,
    client: Client,
    max_pages: u32,
}

impl GithubClient {
    pub fn new(token: &str, base_url: Option<&str>, client: Client, max_pages: u32) -> Self {
        Self {
            token: token.to_string(),
            base_url: base_url
                .unwrap_or(GITHUB_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            client,
            max_pages,
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<(T, HeaderMap), ConnectorError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(|e| transport_error(ConnectorKind::Github, &e))?;
        read_json_with_headers(ConnectorKind::Github, response).await
    }

    /// Walks `Link: rel="next"` URLs; the cursor is the absolute next URL.
    async fn list_paged<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ConnectorError> {
        let first = format!("{}{path}", self.base_url);
        collect_pages(ConnectorKind::Github, self.max_pages, |next| {
            let url = next.unwrap_or_else(|| first.clone());
            async move {
                let (items, headers): (Vec<T>, HeaderMap) = self.get(&url).await?;
                Ok(Page {
                    items,
                    next_cursor: next_link(&headers),
                })
            }
        })
        .await
    }
}

#[async_trait]
impl ConnectorClient for GithubClient {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Github
    }

    async fn get_identity(&self) -> Result<Identity, ConnectorError> {
        let (user, _): (GithubUser, _) = self.get(&format!("{}/user", self.base_url)).await?;
        let display_name = user.name.clone().unwrap_or_else(|| user.login.clone());
        Ok(Identity {
            email: user.email,
            login: Some(user.login),
            ..Identity::new(user.id.to_string(), display_name)
        })
    }

    async fn list_containers(&self) -> Result<Vec<Container>, ConnectorError> {
        let orgs: Vec<GithubOrg> = self.list_paged("/user/orgs?per_page=100").await?;
        Ok(orgs
            .into_iter()
            .map(|org| Container {
                key: Some(org.login.clone()),
                ..Container::new(org.id.to_string(), org.login)
            })
            .collect())
    }

    async fn resolve_id_by_name(
        &self,
        scope: &ScopeContext,
        field: NameField,
        name: &str,
    ) -> Result<Resolution, ConnectorError> {
        let (NameField::TeamName, Some(owner)) = (field, scope.scope_id.as_deref()) else {
            return Ok(Resolution::NotFound);
        };

        let teams: Vec<GithubTeam> = self
            .list_paged(&format!("/orgs/{owner}/teams?per_page=100"))
            .await?;
        Ok(find_by_name(&teams, name, |team| &team.name).map_or(
            Resolution::NotFound,
            |team| {
                let mut fields = Map::new();
                fields.insert("teamId".into(), Value::String(team.id.to_string()));
                fields.insert("teamSlug".into(), Value::String(team.slug.clone()));
                Resolution::Resolved(fields)
            },
        ))
    }

    fn describe(&self, identity: &Identity, containers: &[Container]) -> ConnectorFacts {
        ConnectorFacts {
            user: Some(UserFacts {
                id: identity.id.clone(),
                name: identity.display_name.clone(),
                email: identity.email.clone(),
                login: identity.login.clone(),
            }),
            workspace: containers.first().map(|org| ContainerFacts {
                id: org.id.clone(),
                name: org.display_name.clone(),
                key: org.key.clone(),
            }),
            team: None,
            stats: Some(ConnectorStats {
                container_kind: "organizations".into(),
                containers: containers.len(),
            }),
            bot: None,
        }
    }
}
