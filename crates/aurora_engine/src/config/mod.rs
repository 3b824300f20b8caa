//! Configuration system
//!
//! Scene tuning knobs load from TOML or RON files through the generic
//! [`Config`] trait. Swapping a live scene's configuration raises the
//! `ConfigChanged` event so interested systems can react.

pub use serde::{Deserialize, Serialize};

use crate::scene::transform_system::DEFAULT_STACK_CAPACITY;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
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
            ron::ser::to_string_pretty(self, Default::default())
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

    /// Value out of the accepted range
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Scene runtime tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Bound for the transform traversal stack; exceeding it is treated as a
    /// corrupted hierarchy.
    pub transform_stack_capacity: usize,

    /// Expected node count, used to pre-size node storage.
    pub expected_node_count: usize,

    /// Emit a per-frame stats line at debug level.
    pub log_frame_stats: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            transform_stack_capacity: DEFAULT_STACK_CAPACITY,
            expected_node_count: 1024,
            log_frame_stats: false,
        }
    }
}

impl SceneConfig {
    /// Check the configuration for unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transform_stack_capacity == 0 {
            return Err(ConfigError::Invalid(
                "transform_stack_capacity must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

impl Config for SceneConfig {}
