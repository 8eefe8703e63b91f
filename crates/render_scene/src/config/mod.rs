//! Configuration system

pub use serde::{Deserialize, Serialize};

use crate::scene::ItemFilter;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        // Pick the format from the extension
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value was read but is not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default number of spare slots added whenever item storage grows
pub const DEFAULT_GROWTH_SLACK: usize = 100;

/// Scene storage and bucket configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Item slots allocated up front, including the reserved slot #0
    pub initial_capacity: usize,

    /// Spare slots over-allocated on every growth of the item storage
    pub growth_slack: usize,

    /// Buckets to allocate besides the standard opaque and transparent ones
    pub extra_buckets: Vec<ItemFilter>,
}

impl SceneConfig {
    /// Check that the configuration can back a scene
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::Invalid(
                "initial_capacity must reserve at least slot #0".to_string(),
            ));
        }
        Ok(())
    }

    /// Add a bucket to allocate at construction (builder pattern)
    #[must_use]
    pub fn with_bucket(mut self, filter: ItemFilter) -> Self {
        self.extra_buckets.push(filter);
        self
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1 + DEFAULT_GROWTH_SLACK,
            growth_slack: DEFAULT_GROWTH_SLACK,
            extra_buckets: Vec::new(),
        }
    }
}

impl Config for SceneConfig {}
