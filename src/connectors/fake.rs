//! Scriptable in-process connector for unit tests.

use super::{
    Container, ConnectorClient, ConnectorKind, Identity, NameField, Resolution, ScopeContext,
};
use crate::calibration::{ConnectorFacts, ConnectorStats, ContainerFacts, UserFacts};
use crate::error::ConnectorError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub struct FakeConnector {
    kind: ConnectorKind,
    identity: Result<Identity, ConnectorError>,
    containers: Result<Vec<Container>, ConnectorError>,
    delay: Duration,
    lookups: HashMap<(NameField, String), Resolution>,
    lookup_error: Option<ConnectorError>,
    pub identity_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
}

impl FakeConnector {
    pub fn healthy(kind: ConnectorKind) -> Self {
        let mut identity = Identity::new(format!("{kind}-user"), format!("{kind} user"));
        identity.login = Some(format!("{kind}-login"));
        Self {
            kind,
            identity: Ok(identity),
            containers: Ok(vec![
                Container::new(format!("{kind}-c1"), "Primary"),
                Container::new(format!("{kind}-c2"), "Secondary"),
            ]),
            delay: Duration::ZERO,
            lookups: HashMap::new(),
            lookup_error: None,
            identity_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(kind: ConnectorKind, message: &str) -> Self {
        Self {
            identity: Err(ConnectorError::Auth {
                connector: kind.to_string(),
                message: message.to_string(),
            }),
            ..Self::healthy(kind)
        }
    }

    pub fn with_container_error(mut self, error: ConnectorError) -> Self {
        self.containers = Err(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_lookup(mut self, field: NameField, name: &str, resolution: Resolution) -> Self {
        self.lookups.insert((field, name.to_string()), resolution);
        self
    }

    pub fn with_lookup_error(mut self, error: ConnectorError) -> Self {
        self.lookup_error = Some(error);
        self
    }
}

#[async_trait]
impl ConnectorClient for FakeConnector {
    fn kind(&self) -> ConnectorKind {
        self.kind
    }

    async fn get_identity(&self) -> Result<Identity, ConnectorError> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.identity.clone()
    }

    async fn list_containers(&self) -> Result<Vec<Container>, ConnectorError> {
        self.containers.clone()
    }

    async fn resolve_id_by_name(
        &self,
        _scope: &ScopeContext,
        field: NameField,
        name: &str,
    ) -> Result<Resolution, ConnectorError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.lookup_error {
            return Err(error.clone());
        }
        Ok(self
            .lookups
            .get(&(field, name.to_string()))
            .cloned()
            .unwrap_or(Resolution::NotFound))
    }

    fn describe(&self, identity: &Identity, containers: &[Container]) -> ConnectorFacts {
        let first = containers.first().map(|c| ContainerFacts {
            id: c.id.clone(),
            name: c.display_name.clone(),
            key: c.key.clone(),
        });
        let (workspace, team) = match self.kind {
            ConnectorKind::Linear => (None, first),
            _ => (first, None),
        };
        ConnectorFacts {
            user: Some(UserFacts {
                id: identity.id.clone(),
                name: identity.display_name.clone(),
                email: identity.email.clone(),
                login: identity.login.clone(),
            }),
            workspace,
            team,
            stats: Some(ConnectorStats {
                container_kind: "containers".into(),
                containers: containers.len(),
            }),
            bot: None,
        }
    }
}
