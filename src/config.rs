// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{Result, SyncError};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Concurrency cap for fleet-wide sync fan-out.
    #[serde(default = "default_parallel_workers")]
    pub parallel_workers: usize,
    /// Per-file fetch timeout in seconds. Independent per file.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Interval between batches for the watch command.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/repositories.json")
}

fn default_parallel_workers() -> usize {
    5
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    3600
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            parallel_workers: default_parallel_workers(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DOCSYNC")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        // GITHUB_TOKEN is the conventional variable name; honor it when the
        // prefixed form is absent.
        if config.github.token.is_none() {
            config.github.token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            github: GithubConfig::default(),
            storage: StorageConfig::default(),
            sync: SyncConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.sync.parallel_workers == 0 {
            return Err(SyncError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.sync.fetch_timeout_secs == 0 {
            return Err(SyncError::Config(
                "fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.github.api_url.is_empty() {
            return Err(SyncError::Config("github.api_url must be set".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.sync.parallel_workers, 5);
        assert_eq!(config.sync.fetch_timeout_secs, 30);
        assert_eq!(config.github.api_url, "https://api.github.com");
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default_config();
        config.sync.parallel_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default_config();
        config.sync.fetch_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
