//! `GraphWalk` Configuration Module
//!
//! Default search parameters can be provided via `graphwalk.toml`, environment
//! variables and runtime overrides. Options built with `from_config` start
//! from these values.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (explicit option setters)
//! 2. Environment variables (`GRAPHWALK_*`)
//! 3. Configuration file (`graphwalk.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default maximum depth for traversals.
pub const DEFAULT_MAX_DEPTH: u64 = 3;

/// Safety cap for any configured depth.
pub const SAFETY_MAX_DEPTH: u64 = 100;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Depth-first traversal defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Shortest path length reported.
    pub min_depth: u64,
    /// Longest path length explored.
    pub max_depth: u64,
    /// Upper bound accepted for any depth setting.
    pub safety_max_depth: u64,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            min_depth: 1,
            max_depth: DEFAULT_MAX_DEPTH,
            safety_max_depth: SAFETY_MAX_DEPTH,
        }
    }
}

/// Neighbor search defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborsConfig {
    /// Minimum depth of reported neighbors.
    pub min_depth: u64,
    /// Maximum depth of reported neighbors.
    pub max_depth: u64,
}

impl Default for NeighborsConfig {
    fn default() -> Self {
        Self {
            min_depth: 1,
            max_depth: 1,
        }
    }
}

/// Shortest-path defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortestPathConfig {
    /// Expand from both ends.
    pub bidirectional: bool,
    /// Run the two expansions on separate threads.
    pub multi_threaded: bool,
    /// Weight used when the weight attribute is missing.
    pub default_weight: f64,
    /// Edge attribute holding the weight (empty = none).
    pub weight_attribute: String,
}

impl Default for ShortestPathConfig {
    fn default() -> Self {
        Self {
            bidirectional: true,
            multi_threaded: true,
            default_weight: 1.0,
            weight_attribute: String::new(),
        }
    }
}

/// Main `GraphWalk` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Depth-first traversal defaults.
    pub traversal: TraversalConfig,
    /// Neighbor search defaults.
    pub neighbors: NeighborsConfig,
    /// Shortest-path defaults.
    pub shortest_path: ShortestPathConfig,
}

impl EngineConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("graphwalk.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// Nested keys are addressed with a double underscore in environment
    /// variables, e.g. `GRAPHWALK_SHORTEST_PATH__DEFAULT_WEIGHT=2.5`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("GRAPHWALK_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cap = self.traversal.safety_max_depth;
        if cap == 0 || cap > SAFETY_MAX_DEPTH * 10 {
            return Err(ConfigError::InvalidValue {
                key: "traversal.safety_max_depth".to_string(),
                message: format!("value {cap} is out of range [1, {}]", SAFETY_MAX_DEPTH * 10),
            });
        }

        let ranges = [
            ("traversal", self.traversal.min_depth, self.traversal.max_depth),
            ("neighbors", self.neighbors.min_depth, self.neighbors.max_depth),
        ];
        for (section, min, max) in ranges {
            if min > max {
                return Err(ConfigError::InvalidValue {
                    key: format!("{section}.min_depth"),
                    message: format!("value {min} exceeds max_depth {max}"),
                });
            }
            if max > cap {
                return Err(ConfigError::InvalidValue {
                    key: format!("{section}.max_depth"),
                    message: format!("value {max} exceeds traversal.safety_max_depth {cap}"),
                });
            }
        }

        let weight = self.shortest_path.default_weight;
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "shortest_path.default_weight".to_string(),
                message: format!("value {weight} must be a finite, non-negative number"),
            });
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
