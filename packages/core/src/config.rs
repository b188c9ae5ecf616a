//! Engine configuration
//!
//! `EngineConfig` carries the tunables of the outline engine. It can be
//! built in code, or loaded from a JSON file where every field is optional:
//! missing fields fall back to their defaults so older files keep loading.

use crate::db::OrderAllocator;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration loading/validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Stable keys of the persisted collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub nodes: String,
    pub projects: String,
    pub versions: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            nodes: "layercake-nodes".to_string(),
            projects: "layercake-projects".to_string(),
            versions: "layercake-versions".to_string(),
        }
    }
}

/// Outline engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Gap between allocated sibling orders, and the first sibling's order
    pub order_step: f64,

    /// Maximum number of undo entries kept (oldest dropped first)
    pub history_limit: usize,

    /// Upper bound on any upward parent walk
    pub max_ancestor_depth: usize,

    /// Smallest gap between neighbouring orders before rebalancing is due
    pub rebalance_threshold: f64,

    pub keys: StorageKeys,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            order_step: 1000.0,
            history_limit: 50,
            max_ancestor_depth: 10_000,
            rebalance_threshold: 0.0001,
            keys: StorageKeys::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Save configuration as pretty JSON (write-to-temp, then rename)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(self)?)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.order_step.is_finite() || self.order_step <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "orderStep must be a positive number, got {}",
                self.order_step
            )));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "historyLimit must be at least 1".to_string(),
            ));
        }
        if self.max_ancestor_depth == 0 {
            return Err(ConfigError::Invalid(
                "maxAncestorDepth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Order allocator configured with this step and threshold
    pub fn order_allocator(&self) -> OrderAllocator {
        OrderAllocator::new(self.order_step).with_rebalance_threshold(self.rebalance_threshold)
    }
}
