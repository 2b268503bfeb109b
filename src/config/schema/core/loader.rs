use super::Config;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

fn waypoint_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("WAYPOINT_HOME")
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(".waypoint"))
}

impl Config {
    /// Reads `config.toml` once at startup, writing defaults on first run.
    pub fn load_or_init() -> Result<Self> {
        let waypoint_dir = waypoint_home()?;
        let mut config = Self::load_or_init_in(&waypoint_dir)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_or_init_in(waypoint_dir: &Path) -> Result<Self> {
        let config_path = waypoint_dir.join("config.toml");

        if !waypoint_dir.exists() {
            fs::create_dir_all(waypoint_dir).context("Failed to create .waypoint directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path.clone_from(&config_path);
            Ok(config)
        } else {
            let config = Self {
                config_path,
                state_dir: waypoint_dir.join("state").to_string_lossy().into_owned(),
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
