use super::Config;
use crate::config::ConnectorConfig;
use crate::connectors::ConnectorKind;

fn connector_token_vars(kind: ConnectorKind) -> [&'static str; 2] {
    match kind {
        ConnectorKind::Asana => ["WAYPOINT_ASANA_TOKEN", "ASANA_ACCESS_TOKEN"],
        ConnectorKind::Linear => ["WAYPOINT_LINEAR_TOKEN", "LINEAR_API_KEY"],
        ConnectorKind::Github => ["WAYPOINT_GITHUB_TOKEN", "GITHUB_TOKEN"],
        ConnectorKind::Notion => ["WAYPOINT_NOTION_TOKEN", "NOTION_API_KEY"],
    }
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        for kind in ConnectorKind::ALL {
            // An empty primary variable falls through to the fallback.
            let token = connector_token_vars(kind)
                .into_iter()
                .find_map(|var| std::env::var(var).ok().filter(|value| !value.is_empty()));
            if let Some(token) = token {
                let slot = self.connectors.slot_mut(kind);
                match slot {
                    Some(existing) => existing.token = token,
                    None => *slot = Some(ConnectorConfig::with_token(token)),
                }
            }
        }

        if let Ok(state_dir) = std::env::var("WAYPOINT_STATE_DIR")
            && !state_dir.is_empty()
        {
            self.state_dir = state_dir;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_env::{ENV_LOCK, EnvVarGuard};
    use super::*;

    #[test]
    fn token_env_var_configures_missing_connector() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let _primary = EnvVarGuard::unset("WAYPOINT_LINEAR_TOKEN");
        let _fallback = EnvVarGuard::set("LINEAR_API_KEY", "lin_api_env");

        let mut config = Config::default();
        config.apply_env_overrides();

        let linear = config.connectors.linear.expect("linear configured from env");
        assert_eq!(linear.token, "lin_api_env");
        assert!(linear.base_url.is_none());
    }

    #[test]
    fn primary_env_var_wins_and_keeps_base_url() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let _primary = EnvVarGuard::set("WAYPOINT_GITHUB_TOKEN", "ghp_primary");
        let _fallback = EnvVarGuard::set("GITHUB_TOKEN", "ghp_fallback");

        let mut config = Config::default();
        config.connectors.github = Some(ConnectorConfig {
            token: "from-file".into(),
            base_url: Some("https://ghe.example.com/api/v3".into()),
        });
        config.apply_env_overrides();

        let github = config.connectors.github.unwrap();
        assert_eq!(github.token, "ghp_primary");
        assert_eq!(
            github.base_url.as_deref(),
            Some("https://ghe.example.com/api/v3")
        );
    }

    #[test]
    fn empty_primary_env_var_falls_back() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let _primary = EnvVarGuard::set("WAYPOINT_NOTION_TOKEN", "");
        let _fallback = EnvVarGuard::set("NOTION_API_KEY", "secret_fallback");

        let mut config = Config::default();
        config.apply_env_overrides();

        let notion = config.connectors.notion.expect("notion configured from fallback");
        assert_eq!(notion.token, "secret_fallback");
    }

    #[test]
    fn empty_env_var_is_ignored() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let _primary = EnvVarGuard::set("WAYPOINT_NOTION_TOKEN", "");
        let _fallback = EnvVarGuard::unset("NOTION_API_KEY");
        let _state = EnvVarGuard::set("WAYPOINT_STATE_DIR", "/tmp/waypoint-state");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert!(config.connectors.notion.is_none());
        assert_eq!(config.state_dir, "/tmp/waypoint-state");
    }
}
