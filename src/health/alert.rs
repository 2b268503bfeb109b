use super::{HealthSnapshot, OverallHealth};
use crate::config::MonitorConfig;
use crate::connectors::ConnectorKind;
use crate::connectors::http_client::build_connector_client_with_timeout;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::sync::Arc;

pub const SIGNATURE_HEADER: &str = "X-Waypoint-Signature";

const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Payload delivered when a cycle ends anything other than healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthAlert {
    pub overall: OverallHealth,
    pub failed: Vec<ConnectorKind>,
    pub timestamp: DateTime<Utc>,
}

impl HealthAlert {
    pub fn from_snapshot(snapshot: &HealthSnapshot) -> Self {
        Self {
            overall: snapshot.overall,
            failed: snapshot.failed_connectors(),
            timestamp: snapshot.timestamp,
        }
    }
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, alert: &HealthAlert) -> anyhow::Result<()>;
}

pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, alert: &HealthAlert) -> anyhow::Result<()> {
        let failed: Vec<&str> = alert.failed.iter().map(AsRef::as_ref).collect();
        tracing::warn!(
            overall = %alert.overall,
            failed = ?failed,
            "connector health alert"
        );
        Ok(())
    }
}

pub struct WebhookAlertSink {
    url: String,
    secret: Option<String>,
    client: reqwest::Client,
}

impl WebhookAlertSink {
    pub fn new(url: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            url: url.into(),
            secret,
            client: build_connector_client_with_timeout(WEBHOOK_TIMEOUT_SECS),
        }
    }
}

/// `sha256=<hex HMAC-SHA256 of body>`.
pub fn sign_payload(secret: &str, body: &[u8]) -> anyhow::Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid webhook secret: {e}"))?;
    mac.update(body);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, alert: &HealthAlert) -> anyhow::Result<()> {
        let body = serde_json::to_vec(alert)?;
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, sign_payload(secret, &body)?);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("alert webhook returned HTTP {status}");
        }
        Ok(())
    }
}

pub fn create_alert_sink(config: &MonitorConfig) -> Arc<dyn AlertSink> {
    match &config.alert_webhook_url {
        Some(url) => Arc::new(WebhookAlertSink::new(
            url.clone(),
            config.alert_webhook_secret.clone(),
        )),
        None => Arc::new(LogAlertSink),
    }
}
