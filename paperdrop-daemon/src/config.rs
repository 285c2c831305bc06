//! Daemon Configuration
//!
//! Configuration management for the paperdrop receiver daemon.

use anyhow::{Context, Result};
use paperdrop_receiver::PollConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Polling endpoint configuration
    pub endpoint: EndpointConfig,

    /// Storage configuration
    pub storage: StorageConfig,
}

/// Polling endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// URL probed for new files
    #[serde(default = "default_poll_url")]
    pub poll_url: String,

    /// Probe period in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Bound on a single probe in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory delivered files are written into
    pub download_dir: PathBuf,
}

fn default_poll_url() -> String {
    "http://localhost:5000/next-file".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            poll_url: default_poll_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Default configuration file path (`<config dir>/paperdrop/daemon.toml`).
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("paperdrop")
            .join("daemon.toml")
    }

    /// Load configuration from the given path (or the default location),
    /// creating a default file if none exists yet.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to the given path.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Poller configuration derived from the endpoint section.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            poll_interval: Duration::from_millis(self.endpoint.poll_interval_ms),
            request_timeout: Duration::from_millis(self.endpoint.request_timeout_ms),
        }
    }
}
