//! Notion adapter. Integration tokens authenticate as a bot; the bot's
//! installation workspace is the only container.

use super::http_client::{read_json, transport_error};
use super::{
    BotIdentity, Container, ConnectorClient, ConnectorKind, Identity, NameField, Page,
    Resolution, ScopeContext, collect_pages,
};
use crate::calibration::{BotFacts, ConnectorFacts, ConnectorStats, ContainerFacts, UserFacts};
use crate::error::ConnectorError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};

const NOTION_API_BASE: &str = "https://api.notion.com";
const NOTION_VERSION: &str = "2022-06-28";
const SEARCH_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct NotionUser {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    person: Option<NotionPerson>,
    #[serde(default)]
    bot: Option<NotionBot>,
}

#[derive(Debug, Deserialize)]
struct NotionPerson {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotionBot {
    #[serde(default)]
    owner: Option<BotOwner>,
    #[serde(default)]
    workspace_name: Option<String>,
    #[serde(default)]
    workspace_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotOwner {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Plain-text title of a search hit. Databases keep it at the top level,
/// pages in whichever property has type `title`.
fn title_of(object: &Value) -> Option<String> {
    let rich_text = object.get("title").or_else(|| {
        object
            .get("properties")?
            .as_object()?
            .values()
            .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))?
            .get("title")
    })?;

    let text: String = rich_text
        .as_array()?
        .iter()
        .filter_map(|part| part.get("plain_text").and_then(Value::as_str))
        .collect();
    Some(text)
}

pub struct NotionClient {
    token: String,
    base_url: String,
    client: Client,
    max_pages: u32,
}

impl NotionClient {
    pub fn new(token: &str, base_url: Option<&str>, client: Client, max_pages: u32) -> Self {
        Self {
            token: token.to_string(),
            base_url: base_url
                .unwrap_or(NOTION_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            client,
            max_pages,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn me(&self) -> Result<NotionUser, ConnectorError> {
        let response = self
            .request(reqwest::Method::GET, "/v1/users/me")
            .send()
            .await
            .map_err(|e| transport_error(ConnectorKind::Notion, &e))?;
        read_json(ConnectorKind::Notion, response).await
    }

    /// Search hits whose title equals `name`, across all result pages.
    async fn search_titled(&self, name: &str) -> Result<Vec<Value>, ConnectorError> {
        let wanted = name.trim();
        let hits = collect_pages(ConnectorKind::Notion, self.max_pages, |cursor| async move {
            let mut body = json!({ "query": wanted, "page_size": SEARCH_PAGE_SIZE });
            if let Some(cursor) = cursor {
                body["start_cursor"] = Value::String(cursor);
            }
            let response = self
                .request(reqwest::Method::POST, "/v1/search")
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error(ConnectorKind::Notion, &e))?;
            let page: SearchResponse = read_json(ConnectorKind::Notion, response).await?;
            Ok(Page {
                items: page.results,
                next_cursor: page.next_cursor.filter(|_| page.has_more),
            })
        })
        .await?;

        Ok(hits
            .into_iter()
            .filter(|hit| {
                title_of(hit).is_some_and(|title| title.trim().eq_ignore_ascii_case(wanted))
            })
            .collect())
    }
}

#[async_trait]
impl ConnectorClient for NotionClient {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Notion
    }

    async fn get_identity(&self) -> Result<Identity, ConnectorError> {
        let user = self.me().await?;
        let display_name = user.name.clone().unwrap_or_else(|| user.id.clone());
        Ok(Identity {
            email: user.person.and_then(|person| person.email),
            bot: user.bot.map(|bot| BotIdentity {
                owner: bot
                    .owner
                    .map_or_else(|| "unknown".to_string(), |owner| owner.kind),
                workspace_id: bot.workspace_id,
                workspace_name: bot.workspace_name,
            }),
            ..Identity::new(user.id, display_name)
        })
    }

    /// The integration sees exactly one workspace. Older tokens omit the
    /// workspace id, in which case the bot id stands in for it.
    async fn list_containers(&self) -> Result<Vec<Container>, ConnectorError> {
        let identity = self.get_identity().await?;
        let Some(bot) = identity.bot else {
            return Ok(Vec::new());
        };
        let id = bot.workspace_id.unwrap_or_else(|| identity.id.clone());
        let name = bot
            .workspace_name
            .unwrap_or_else(|| identity.display_name.clone());
        Ok(vec![Container::new(id, name)])
    }

    async fn resolve_id_by_name(
        &self,
        _scope: &ScopeContext,
        field: NameField,
        name: &str,
    ) -> Result<Resolution, ConnectorError> {
        let key = match field {
            NameField::Name => "id",
            NameField::ProjectName => "projectId",
            NameField::TeamName => return Ok(Resolution::NotFound),
        };

        let hits = self.search_titled(name).await?;
        let Some(id) = hits
            .first()
            .and_then(|hit| hit.get("id"))
            .and_then(Value::as_str)
        else {
            return Ok(Resolution::NotFound);
        };

        let mut fields = Map::new();
        fields.insert(key.to_string(), Value::String(id.to_string()));
        Ok(Resolution::Resolved(fields))
    }

    fn describe(&self, identity: &Identity, containers: &[Container]) -> ConnectorFacts {
        let workspace = containers.first().map(|ws| ContainerFacts {
            id: ws.id.clone(),
            name: ws.display_name.clone(),
            key: None,
        });

        match &identity.bot {
            Some(bot) => ConnectorFacts {
                user: None,
                workspace,
                team: None,
                stats: Some(ConnectorStats {
                    container_kind: "workspaces".into(),
                    containers: containers.len(),
                }),
                bot: Some(BotFacts {
                    id: identity.id.clone(),
                    name: identity.display_name.clone(),
                    owner: bot.owner.clone(),
                }),
            },
            None => ConnectorFacts {
                user: Some(UserFacts {
                    id: identity.id.clone(),
                    name: identity.display_name.clone(),
                    email: identity.email.clone(),
                    login: None,
                }),
                workspace,
                team: None,
                stats: None,
                bot: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::http_client::build_connector_client;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> NotionClient {
        NotionClient::new("secret_abc", Some(&server.uri()), build_connector_client(), 10)
    }

    fn bot_body() -> Value {
        json!({
            "object": "user",
            "id": "bot-1",
            "name": "Waypoint",
            "type": "bot",
            "bot": {
                "owner": {"type": "workspace", "workspace": true},
                "workspace_name": "Acme HQ",
                "workspace_id": "ws-42"
            }
        })
    }

    #[test]
    fn title_from_database_and_page() {
        let database = json!({
            "object": "database",
            "title": [{"plain_text": "Road"}, {"plain_text": "map"}]
        });
        assert_eq!(title_of(&database).as_deref(), Some("Roadmap"));

        let page = json!({
            "object": "page",
            "properties": {
                "Status": {"type": "select"},
                "Name": {"type": "title", "title": [{"plain_text": "Launch plan"}]}
            }
        });
        assert_eq!(title_of(&page).as_deref(), Some("Launch plan"));
        assert!(title_of(&json!({"object": "page"})).is_none());
    }

    #[tokio::test]
    async fn bot_identity_carries_workspace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/me"))
            .and(header("notion-version", NOTION_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(bot_body()))
            .mount(&server)
            .await;

        let notion = client(&server);
        let identity = notion.get_identity().await.unwrap();
        let bot = identity.bot.clone().unwrap();
        assert_eq!(bot.owner, "workspace");
        assert_eq!(bot.workspace_id.as_deref(), Some("ws-42"));

        let containers = notion.list_containers().await.unwrap();
        assert_eq!(containers, vec![Container::new("ws-42", "Acme HQ")]);

        let facts = notion.describe(&identity, &containers);
        assert_eq!(facts.bot.unwrap().owner, "workspace");
        assert_eq!(facts.workspace.unwrap().id, "ws-42");
        assert!(facts.user.is_none());
    }

    #[tokio::test]
    async fn invalid_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "object": "error", "status": 401, "code": "unauthorized",
                "message": "API token is invalid."
            })))
            .mount(&server)
            .await;

        let err = client(&server).get_identity().await.unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("API token is invalid."));
    }

    #[tokio::test]
    async fn search_follows_cursor_and_matches_exact_title() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .and(body_partial_json(json!({"start_cursor": "cur-2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"object": "database", "id": "db-7", "title": [{"plain_text": "Roadmap"}]}
                ],
                "has_more": false,
                "next_cursor": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "object": "database",
                    "id": "db-1",
                    "title": [{"plain_text": "Roadmap archive"}]
                }],
                "has_more": true,
                "next_cursor": "cur-2"
            })))
            .mount(&server)
            .await;

        let resolution = client(&server)
            .resolve_id_by_name(&ScopeContext::default(), NameField::ProjectName, "roadmap")
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::single("projectId", "db-7"));
    }

    #[tokio::test]
    async fn team_lookup_is_unsupported() {
        let server = MockServer::start().await;
        let resolution = client(&server)
            .resolve_id_by_name(&ScopeContext::default(), NameField::TeamName, "Design")
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::NotFound);
    }
}
