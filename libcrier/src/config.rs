//! Configuration management for crier

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

pub const DEFAULT_SCHEDULER_INTERVAL_SECONDS: u64 = 5;
pub const DEFAULT_SCHEDULER_BATCH_LIMIT: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/crier/crier.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub dir: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: "~/.local/share/crier/media".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Name of the delivery backend. Unrecognized names fall back to the
    /// built-in stub at startup.
    pub provider: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            provider: "stub".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between scheduler wake-ups
    pub interval_seconds: u64,
    /// Maximum number of due schedules claimed per wake-up
    pub batch_limit: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_SCHEDULER_INTERVAL_SECONDS,
            batch_limit: DEFAULT_SCHEDULER_BATCH_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// A missing file yields the built-in defaults; a present but broken
    /// file is an error.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default_config());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig::default(),
            media: MediaConfig::default(),
            publisher: PublisherConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.scheduler.interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.interval_seconds",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        if self.scheduler.batch_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.batch_limit",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CRIER_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("crier").join("config.toml"))
}
