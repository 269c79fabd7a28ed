// Configuration loading and saving (RON)

use crate::command::manager::DEFAULT_MAX_HISTORY;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Default capacity of the failure notification ring buffer
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub history: HistoryConfig,
    pub queue: QueueConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undoable commands kept (0 = unbounded)
    pub max_history: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Name attached to every log line the queue emits
    pub name: String,
    /// Capacity of the failure notification ring buffer
    pub notification_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl CoreConfig {
    /// Parse a config from RON text; missing fields take their defaults
    pub fn from_ron_str(data: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig =
            ron::from_str(data).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config = Self::from_ron_str(&data)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        fs::write(path, self.to_ron_string()?)?;
        info!("Config saved to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.name.trim().is_empty() {
            return Err(ConfigError::Invalid("queue name cannot be empty".into()));
        }
        if self.queue.notification_capacity == 0 {
            return Err(ConfigError::Invalid(
                "notification_capacity must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
