//! Configuration management.
//!
//! Loads configuration from `${BDX_HOME}/config.toml` with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod paths {
    //! Path resolution for BDX configuration and session data.
    //!
    //! BDX_HOME resolution order:
    //! 1. BDX_HOME environment variable (if set)
    //! 2. ~/.config/bdx (default)

    use std::path::PathBuf;

    /// Returns the BDX home directory.
    pub fn bdx_home() -> PathBuf {
        if let Ok(home) = std::env::var("BDX_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("bdx"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        bdx_home().join("config.toml")
    }

    /// Returns the directory holding the persisted session.
    pub fn session_dir() -> PathBuf {
        bdx_home()
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the auction backend.
    pub base_url: String,

    /// Snapshot poll cadence in milliseconds.
    pub poll_interval_ms: u64,

    /// Local countdown tick in milliseconds.
    pub tick_interval_ms: u64,

    /// Ending window used when the start countdown hits zero before the
    /// server reports the auction in progress.
    pub fallback_end_secs: i64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Config {
    const DEFAULT_BASE_URL: &'static str = "http://localhost:8000";
    const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
    const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
    const DEFAULT_FALLBACK_END_SECS: i64 = 60;
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
            tick_interval_ms: Self::DEFAULT_TICK_INTERVAL_MS,
            fallback_end_secs: Self::DEFAULT_FALLBACK_END_SECS,
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}
