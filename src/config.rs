use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventConfig {
    /// Event length in minutes when only a start time could be parsed.
    pub default_duration_minutes: Option<i64>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { default_duration_minutes: Some(30) }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print a Google Calendar link along with the parsed fields.
    pub show_link: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { show_link: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event: EventConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        // If config doesn't exist, create default
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save()?;
            return Ok(default_config);
        }

        // Read and parse config file
        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Serialize and save config
        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }
}

fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "eventspeak", "eventspeak")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
