//! Configuration loading and validation for mx-core.
//!
//! This module handles:
//! - Loading `config.json` (agent tuning and portal connection settings)
//! - Config resolution order (CLI > env > XDG > defaults)
//! - Semantic validation (epsilon range, explore range, timeouts)
//! - Config snapshot generation for the episode report

pub mod credential;

pub use credential::Credential;

use crate::policy::PolicyParams;
use crate::transport::HttpPortalConfig;
use mx_common::Action;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "mortyx";

/// Config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.json";

/// Portal used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://challenge.sphinxhq.com";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl From<ConfigError> for mx_common::Error {
    fn from(err: ConfigError) -> Self {
        mx_common::Error::Config(err.to_string())
    }
}

/// Agent tuning and portal connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub schema_version: String,
    /// Exploration probability, in (0, 1].
    pub epsilon: f64,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Extra attempts for a failed status poll.
    pub status_retries: u32,
    pub retry_backoff_ms: u64,
    /// Action seeded into the table before the first step.
    pub bootstrap_action: Action,
    /// Prior average reward of the bootstrap action.
    pub bootstrap_reward: f64,
    pub explore_min: u32,
    pub explore_max: u32,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
    /// Stop after this many steps even if the pool is not empty.
    pub max_steps: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let policy = PolicyParams::default();
        AgentConfig {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            epsilon: policy.epsilon,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            status_retries: 2,
            retry_backoff_ms: 250,
            bootstrap_action: Action::new(2, 2, 2),
            bootstrap_reward: 0.1,
            explore_min: policy.explore_min,
            explore_max: policy.explore_max,
            seed: None,
            max_steps: None,
        }
    }
}

impl AgentConfig {
    pub fn policy_params(&self) -> PolicyParams {
        PolicyParams {
            epsilon: self.epsilon,
            explore_min: self.explore_min,
            explore_max: self.explore_max,
        }
    }

    pub fn http_config(&self, credential: Credential) -> HttpPortalConfig {
        HttpPortalConfig {
            base_url: self.base_url.clone(),
            credential,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            status_retries: self.status_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    /// Apply CLI/env overrides on top of file values.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(epsilon) = overrides.epsilon {
            self.epsilon = epsilon;
        }
        if let Some(url) = &overrides.base_url {
            self.base_url = url.clone();
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if overrides.seed.is_some() {
            self.seed = overrides.seed;
        }
        if overrides.max_steps.is_some() {
            self.max_steps = overrides.max_steps;
        }
    }

    /// Semantic validation beyond what serde checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy_params()
            .validate()
            .map_err(|e| ConfigError::Invalid {
                field: "policy",
                message: e.to_string(),
            })?;
        if !(0.0..=1.0).contains(&self.bootstrap_reward) {
            return Err(ConfigError::Invalid {
                field: "bootstrap_reward",
                message: format!("must be in [0, 1], got {}", self.bootstrap_reward),
            });
        }
        if self.bootstrap_action.is_zero() {
            return Err(ConfigError::Invalid {
                field: "bootstrap_action",
                message: "must send at least one unit".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                message: "must be positive".to_string(),
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "connect_timeout_secs",
                message: "must be positive".to_string(),
            });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "base_url",
                message: format!("must be an http(s) URL, got '{}'", self.base_url),
            });
        }
        if self.max_steps == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_steps",
                message: "must be positive when set".to_string(),
            });
        }
        Ok(())
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub epsilon: Option<f64>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub seed: Option<u64>,
    pub max_steps: Option<u64>,
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config directory.
    pub config_dir: Option<PathBuf>,
    /// Explicit config file (highest priority).
    pub config_path: Option<PathBuf>,
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub agent: AgentConfig,
    /// Path of the file the values came from (None if using defaults).
    pub config_path: Option<PathBuf>,
    /// Hash of the file content (None if using defaults).
    pub config_hash: Option<String>,
    pub config_dir: PathBuf,
}

impl ResolvedConfig {
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            config_path: self.config_path.clone(),
            config_hash: self.config_hash.clone(),
            epsilon: self.agent.epsilon,
            base_url: self.agent.base_url.clone(),
            seed: self.agent.seed,
            max_steps: self.agent.max_steps,
        }
    }
}

/// Config provenance recorded in the episode report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub config_path: Option<PathBuf>,
    pub config_hash: Option<String>,
    pub epsilon: f64,
    pub base_url: String,
    pub seed: Option<u64>,
    pub max_steps: Option<u64>,
}

/// Load configuration with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit config file (`--config` / `MX_CONFIG`)
/// 2. `config.json` in the explicit config dir or `MORTYX_CONFIG_DIR`
/// 3. `config.json` in the XDG config home (~/.config/mortyx/)
/// 4. Built-in defaults
///
/// CLI overrides are applied afterwards, then the result is validated.
pub fn load_config(
    options: &ConfigOptions,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig, ConfigError> {
    let config_dir = resolve_config_dir(options);

    let (mut agent, config_path, config_hash) = match &options.config_path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound { path: path.clone() });
            }
            let (agent, hash) = load_agent_from_file(path)?;
            (agent, Some(path.clone()), Some(hash))
        }
        None => {
            let default_path = config_dir.join(CONFIG_FILE_NAME);
            if default_path.exists() {
                let (agent, hash) = load_agent_from_file(&default_path)?;
                (agent, Some(default_path), Some(hash))
            } else {
                (AgentConfig::default(), None, None)
            }
        }
    };

    agent.apply(overrides);
    agent.validate()?;

    Ok(ResolvedConfig {
        agent,
        config_path,
        config_hash,
        config_dir,
    })
}

fn resolve_config_dir(options: &ConfigOptions) -> PathBuf {
    if let Some(dir) = &options.config_dir {
        return dir.clone();
    }

    if let Ok(dir) = std::env::var("MORTYX_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    let xdg_config = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });

    xdg_config.join(CONFIG_DIR_NAME)
}

fn load_agent_from_file(path: &Path) -> Result<(AgentConfig, String), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let hash = compute_hash(&content);

    let agent: AgentConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    if agent.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(ConfigError::VersionMismatch {
            expected: CONFIG_SCHEMA_VERSION.to_string(),
            actual: agent.schema_version.clone(),
        });
    }

    Ok((agent, hash))
}

fn compute_hash(content: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
