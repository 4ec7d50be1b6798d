//! Project configuration file support for helpdesk.
//!
//! Loads configuration from `helpdesk.toml` in the config directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Project-level configuration loaded from `helpdesk.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Database file to use instead of the platform default
    pub db_path: Option<PathBuf>,
    /// Log output format: "pretty", "json", or "compact"
    pub log_format: Option<String>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "helpdesk.toml";

impl ProjectConfig {
    /// Load configuration from the given directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }
}
