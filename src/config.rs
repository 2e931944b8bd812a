use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::analysis::classifier::{DEFAULT_SPAM_CHANGE_THRESHOLD, DEFAULT_SPAM_FILE_COUNT};

pub const CONFIG_FILE: &str = ".pr-quality.toml";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-quality.toml.
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub spam: SpamConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// Base URL of the REST API (GitHub Enterprise installs differ).
    pub api_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Page size requested from list endpoints
    pub per_page: u8,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            per_page: 100,
        }
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Thresholds for the spam heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpamConfig {
    /// A PR must touch exactly this many files to be suspect
    pub file_count: usize,
    /// and change fewer lines than this in total
    pub min_changes: u64,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            file_count: DEFAULT_SPAM_FILE_COUNT,
            min_changes: DEFAULT_SPAM_CHANGE_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration from .pr-quality.toml in the current directory.
    /// Returns default config if the file doesn't exist. A token from the
    /// GITHUB_TOKEN env var fills in when the file has none.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                config.github.token = Some(token);
            }
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// The token to authenticate with, if any. Blank values count as unset.
    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone().filter(|token| !token.trim().is_empty())
    }
}
