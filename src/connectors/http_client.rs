use super::ConnectorKind;
use crate::error::ConnectorError;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 500;

pub fn build_connector_client() -> Client {
    build_connector_client_with_timeout(30)
}

pub fn build_connector_client_with_timeout(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .user_agent(concat!("waypoint/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

pub(crate) fn transport_error(connector: ConnectorKind, error: &reqwest::Error) -> ConnectorError {
    ConnectorError::Transport {
        connector: connector.to_string(),
        message: error.to_string(),
    }
}

pub(crate) fn malformed(connector: ConnectorKind, message: impl Into<String>) -> ConnectorError {
    ConnectorError::Malformed {
        connector: connector.to_string(),
        message: message.into(),
    }
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == "0")
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{cut}…")
    }
}

/// Maps a non-success HTTP status onto the connector error taxonomy.
///
/// Auth failures keep the provider body verbatim for operator diagnosis.
pub(crate) fn classify_status(
    connector: ConnectorKind,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> Option<ConnectorError> {
    if status.is_success() {
        return None;
    }

    let connector_name = connector.to_string();
    let error = if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && rate_limit_exhausted(headers))
    {
        ConnectorError::RateLimited {
            connector: connector_name,
            retry_after_secs: retry_after_secs(headers),
        }
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ConnectorError::Auth {
            connector: connector_name,
            message: body.trim().to_string(),
        }
    } else {
        ConnectorError::Transport {
            connector: connector_name,
            message: format!("HTTP {status}: {}", truncate_body(body)),
        }
    };
    Some(error)
}

/// Reads the body, classifies the status, then decodes JSON.
pub(crate) async fn read_json<T: DeserializeOwned>(
    connector: ConnectorKind,
    response: Response,
) -> Result<T, ConnectorError> {
    let (body, _) = read_json_with_headers(connector, response).await?;
    Ok(body)
}

pub(crate) async fn read_json_with_headers<T: DeserializeOwned>(
    connector: ConnectorKind,
    response: Response,
) -> Result<(T, HeaderMap), ConnectorError> {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(connector, &e))?;

    if let Some(error) = classify_status(connector, status, &headers, &body) {
        return Err(error);
    }

    let decoded = serde_json::from_str(&body).map_err(|e| malformed(connector, e.to_string()))?;
    Ok((decoded, headers))
}
