//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which covers the data server base URL and an optional override for
//! where the durable tables live.
//!
//! Configuration is stored at `~/.config/dinefinder/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "dinefinder";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default base URL of the restaurant data server.
const DEFAULT_API_BASE_URL: &str = "http://localhost:1337";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Resolved data server base URL, without a trailing slash.
    pub fn base_url(&self) -> String {
        self.api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    /// Directory holding the durable tables. `None` when the platform
    /// offers no data directory and no override is configured; the cache
    /// layer then runs in pass-through mode.
    pub fn table_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Some(dir.clone());
        }
        dirs::data_dir().map(|dir| dir.join(APP_NAME))
    }
}
