//! Configuration management for Ballotchain

use crate::error::{LedgerError, Result};
use crate::roster::Roster;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub roster: RosterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors")]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: default_cors(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default = "default_export_file")]
    pub export_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            export_file: default_export_file(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterConfig {
    /// JSON roster file; the built-in roster is used when unset.
    pub file: Option<String>,
}

impl Config {
    pub fn data_file(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_file)
    }

    pub fn export_file(&self) -> PathBuf {
        PathBuf::from(&self.storage.export_file)
    }

    pub fn load_roster(&self) -> Result<Roster> {
        match &self.roster.file {
            Some(path) => Roster::load(Path::new(path)),
            None => Ok(Roster::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.storage.data_file.trim().is_empty() {
            return Err(LedgerError::Config("storage.data_file must be set".to_string()));
        }
        if self.storage.export_file.trim().is_empty() {
            return Err(LedgerError::Config("storage.export_file must be set".to_string()));
        }
        Ok(())
    }
}

/// Load `config.toml` from the working directory, falling back to defaults.
pub fn load_config() -> Result<Config> {
    load_config_from(Path::new(DEFAULT_CONFIG_PATH))
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let mut config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };

    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
        config.server.port = port;
    }

    config.validate()?;
    Ok(config)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors() -> bool {
    true
}

fn default_data_file() -> String {
    "chain_data.json".to_string()
}

fn default_export_file() -> String {
    "export_chain.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str("[storage]\ndata_file = \"votes.json\"\n").unwrap();
        assert_eq!(config.storage.data_file, "votes.json");
        assert_eq!(config.storage.export_file, "export_chain.json");
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.server.cors);
        assert!(config.roster.file.is_none());
    }

    #[test]
    fn test_empty_data_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[storage]\ndata_file = \"\"\n").unwrap();

        assert!(matches!(load_config_from(&path), Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_roster_defaults_without_file() {
        let roster = Config::default().load_roster().unwrap();
        assert_eq!(roster, Roster::default());
    }
}
