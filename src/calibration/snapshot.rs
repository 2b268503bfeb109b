use crate::connectors::ConnectorKind;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bumped whenever the persisted layout changes incompatibly.
pub const SNAPSHOT_VERSION: u32 = 1;

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CalibrationState {
    Authenticated,
    Failed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFacts {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
}

/// A workspace, team or organization as recorded in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerFacts {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStats {
    /// What the connector calls its containers: workspaces, teams, organizations.
    pub container_kind: String,
    pub containers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotFacts {
    pub id: String,
    pub name: String,
    pub owner: String,
}

/// Identity facts an adapter extracts from a successful probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorFacts {
    pub user: Option<UserFacts>,
    pub workspace: Option<ContainerFacts>,
    pub team: Option<ContainerFacts>,
    pub stats: Option<ConnectorStats>,
    pub bot: Option<BotFacts>,
}

/// Per-connector calibration result.
///
/// Built only through [`ConnectorStatus::authenticated`],
/// [`ConnectorStatus::failed`] and [`ConnectorStatus::pending`], so a
/// failed status never carries identity facts and an authenticated one
/// never carries an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStatus {
    pub status: CalibrationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserFacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<ContainerFacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<ContainerFacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ConnectorStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<BotFacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_verified: DateTime<Utc>,
}

impl ConnectorStatus {
    pub fn authenticated(facts: ConnectorFacts, at: DateTime<Utc>) -> Self {
        Self {
            status: CalibrationState::Authenticated,
            user: facts.user,
            workspace: facts.workspace,
            team: facts.team,
            stats: facts.stats,
            bot: facts.bot,
            error: None,
            last_verified: at,
        }
    }

    pub fn failed(error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: CalibrationState::Failed,
            user: None,
            workspace: None,
            team: None,
            stats: None,
            bot: None,
            error: Some(error.into()),
            last_verified: at,
        }
    }

    pub fn pending(at: DateTime<Utc>) -> Self {
        Self {
            status: CalibrationState::Pending,
            user: None,
            workspace: None,
            team: None,
            stats: None,
            bot: None,
            error: None,
            last_verified: at,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == CalibrationState::Authenticated
    }

    fn has_identity_facts(&self) -> bool {
        self.user.is_some()
            || self.workspace.is_some()
            || self.team.is_some()
            || self.stats.is_some()
            || self.bot.is_some()
    }

    /// True when the status/error/identity invariants hold.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            CalibrationState::Authenticated => self.error.is_none(),
            CalibrationState::Failed => self.error.is_some() && !self.has_identity_facts(),
            CalibrationState::Pending => self.error.is_none() && !self.has_identity_facts(),
        }
    }

    /// Identifier that scopes calls to `kind`, when calibration found one.
    pub fn scope_id(&self, kind: ConnectorKind) -> Option<&str> {
        if !self.is_authenticated() {
            return None;
        }
        match kind {
            ConnectorKind::Asana | ConnectorKind::Notion => {
                self.workspace.as_ref().map(|w| w.id.as_str())
            }
            ConnectorKind::Linear => self.team.as_ref().map(|t| t.id.as_str()),
            ConnectorKind::Github => self.user.as_ref().and_then(|u| u.login.as_deref()),
        }
    }
}

/// One calibration run. Never mutated after it is built; a new run
/// replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationSnapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub connectors: BTreeMap<ConnectorKind, ConnectorStatus>,
}

impl CalibrationSnapshot {
    pub fn new(
        timestamp: DateTime<Utc>,
        connectors: BTreeMap<ConnectorKind, ConnectorStatus>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            timestamp,
            connectors,
        }
    }

    pub fn get(&self, kind: ConnectorKind) -> Option<&ConnectorStatus> {
        self.connectors.get(&kind)
    }

    pub fn failed_connectors(&self) -> Vec<ConnectorKind> {
        self.connectors
            .iter()
            .filter(|(_, status)| status.status == CalibrationState::Failed)
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn all_authenticated(&self) -> bool {
        self.connectors.values().all(ConnectorStatus::is_authenticated)
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    pub fn age(&self) -> Duration {
        self.age_at(Utc::now())
    }

    /// Strictly older than `max_age` at `now`.
    pub fn is_stale_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age_at(now) > max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts() -> ConnectorFacts {
        ConnectorFacts {
            user: Some(UserFacts {
                id: "42".into(),
                name: "Octo Cat".into(),
                email: None,
                login: Some("octocat".into()),
            }),
            workspace: Some(ContainerFacts {
                id: "ws-1".into(),
                name: "Acme".into(),
                key: None,
            }),
            team: Some(ContainerFacts {
                id: "team-1".into(),
                name: "Platform".into(),
                key: Some("PLT".into()),
            }),
            stats: None,
            bot: None,
        }
    }

    #[test]
    fn constructors_uphold_invariants() {
        let now = Utc::now();
        let ok = ConnectorStatus::authenticated(facts(), now);
        let failed = ConnectorStatus::failed("github authentication failed: Bad credentials", now);
        let pending = ConnectorStatus::pending(now);

        assert!(ok.is_consistent());
        assert!(failed.is_consistent());
        assert!(pending.is_consistent());
        assert!(failed.user.is_none());
        assert!(ok.error.is_none());
    }

    #[test]
    fn scope_id_follows_connector_convention() {
        let status = ConnectorStatus::authenticated(facts(), Utc::now());
        assert_eq!(status.scope_id(ConnectorKind::Asana), Some("ws-1"));
        assert_eq!(status.scope_id(ConnectorKind::Notion), Some("ws-1"));
        assert_eq!(status.scope_id(ConnectorKind::Linear), Some("team-1"));
        assert_eq!(status.scope_id(ConnectorKind::Github), Some("octocat"));
    }

    #[test]
    fn failed_status_has_no_scope() {
        let status = ConnectorStatus::failed("boom", Utc::now());
        assert_eq!(status.scope_id(ConnectorKind::Asana), None);
    }

    #[test]
    fn staleness_is_strict() {
        let now = Utc::now();
        let snapshot = CalibrationSnapshot::new(now - Duration::hours(24), BTreeMap::new());
        assert!(!snapshot.is_stale_at(now, Duration::hours(24)));
        assert!(snapshot.is_stale_at(now + Duration::seconds(1), Duration::hours(24)));
    }

    #[test]
    fn serializes_connector_names_as_keys() {
        let mut connectors = BTreeMap::new();
        connectors.insert(
            ConnectorKind::Linear,
            ConnectorStatus::failed("linear request failed: timeout", Utc::now()),
        );
        let snapshot = CalibrationSnapshot::new(Utc::now(), connectors);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["connectors"]["linear"]["status"], "failed");
        assert!(json["connectors"]["linear"].get("user").is_none());
        assert_eq!(json["version"], SNAPSHOT_VERSION);
    }
}
