//! Configuration management for Taskchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from a YAML file, environment variables, and CLI
//! overrides.

use crate::cli::Cli;
use crate::error::{Result, TaskchatError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Taskchat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend command-endpoint settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Chat surface settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend command-endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the todo backend API
    ///
    /// The command endpoint is `{api_base}/ai-chat/command` and the
    /// fallback task refetch hits `{api_base}/todos`. A trailing slash is
    /// tolerated.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds
    ///
    /// The protocol contract leaves the bound unspecified; expiry is
    /// treated as a dispatch failure.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_api_base() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Chat surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Directory holding the persisted conversation database
    ///
    /// `None` resolves to the platform data directory at startup.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Delay before the fallback task refetch after an action without a
    /// payload (milliseconds)
    ///
    /// Workaround for the backend's missing read-after-write guarantee on
    /// AI-triggered mutations; payload-carrying replies skip it entirely.
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,

    /// Maximum number of past turns replayed when the REPL starts
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_refresh_delay_ms() -> u64 {
    500
}

fn default_history_limit() -> usize {
    20
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            refresh_delay_ms: default_refresh_delay_ms(),
            history_limit: default_history_limit(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, then apply environment and CLI
    /// overrides
    ///
    /// A missing file is not an error: defaults apply, since the CLI must
    /// work out of the box against a local backend.
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&contents)
                .map_err(|e| TaskchatError::Config(format!("Failed to parse {}: {}", path, e)))?
        } else {
            tracing::debug!("No config file at {}, using defaults", path);
            Self::default()
        };

        if let Ok(api_base) = std::env::var("TASKCHAT_API_BASE") {
            config.backend.api_base = api_base;
        }
        if let Ok(state_dir) = std::env::var("TASKCHAT_STATE_DIR") {
            config.chat.state_dir = Some(PathBuf::from(state_dir));
        }
        if let Some(state_dir) = &cli.state_dir {
            config.chat.state_dir = Some(state_dir.clone());
        }

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `TaskchatError::Config` when a value cannot work at all
    /// (empty or schemeless API base, zero timeout).
    pub fn validate(&self) -> Result<()> {
        if self.backend.api_base.is_empty() {
            return Err(TaskchatError::Config("backend.api_base is empty".to_string()).into());
        }
        if !self.backend.api_base.starts_with("http://")
            && !self.backend.api_base.starts_with("https://")
        {
            return Err(TaskchatError::Config(format!(
                "backend.api_base must be an http(s) URL: {}",
                self.backend.api_base
            ))
            .into());
        }
        if self.backend.timeout_seconds == 0 {
            return Err(
                TaskchatError::Config("backend.timeout_seconds must be > 0".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Resolve the state directory, falling back to the platform data dir
    pub fn resolve_state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.chat.state_dir {
            return Ok(dir.clone());
        }
        let dirs = directories::ProjectDirs::from("", "", "taskchat").ok_or_else(|| {
            TaskchatError::Config("Cannot determine a platform data directory".to_string())
        })?;
        Ok(dirs.data_dir().to_path_buf())
    }
}
