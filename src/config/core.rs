//! Core configuration structure and builder for exact-gbdt.
//!
//! A [`Config`] is fixed once a [`Gbdt`](crate::boosting::Gbdt) is
//! constructed. Every tree of the ensemble is grown with the same
//! [`TreeParams`] derived from it.

use crate::core::constants::*;
use crate::core::error::{GbdtError, Result};
use crate::core::types::*;
use crate::config_error;
use crate::tree::TreeParams;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Depth of every tree; each tree is grown for exactly this many levels
    pub max_depth: usize,
    /// Number of trees in the ensemble
    pub num_trees: usize,
    /// Leaves with fewer active instances than this stop being refined
    pub min_leaf_size: usize,
    /// Worker threads for tree fitting and batch passes (0 = all cores)
    pub num_threads: usize,
    /// Progress reporting level
    pub verbosity: VerbosityLevel,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            num_trees: DEFAULT_NUM_TREES,
            min_leaf_size: DEFAULT_MIN_LEAF_SIZE,
            num_threads: DEFAULT_NUM_THREADS,
            verbosity: DEFAULT_VERBOSITY,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_depth < 1 || self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(GbdtError::invalid_parameter(
                "max_depth",
                self.max_depth.to_string(),
                format!("must be in range [1, {}]", MAX_SUPPORTED_DEPTH),
            ));
        }

        if self.num_trees < 1 {
            return Err(GbdtError::invalid_parameter(
                "num_trees",
                self.num_trees.to_string(),
                "must be at least 1",
            ));
        }

        if self.min_leaf_size < 1 {
            return Err(GbdtError::invalid_parameter(
                "min_leaf_size",
                self.min_leaf_size.to_string(),
                "must be at least 1",
            ));
        }

        if self.num_threads > num_cpus::get() * 2 {
            log::warn!(
                "num_threads ({}) is much larger than available cores ({})",
                self.num_threads,
                num_cpus::get()
            );
        }

        Ok(())
    }

    /// Tree growth parameters shared by every tree of the ensemble.
    pub fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_leaf_size: self.min_leaf_size,
        }
    }

    /// Whether per-round progress should be reported.
    pub fn verbose(&self) -> bool {
        self.verbosity.reports_rounds()
    }

    /// Get the effective number of threads (0 means use all available cores)
    pub fn effective_num_threads(&self) -> usize {
        crate::core::utils::threading::effective_num_threads(self.num_threads)
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| config_error!("Failed to read config file: {}", e))?;

        let config: Config = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| config_error!("Failed to parse JSON config: {}", e))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| config_error!("Failed to parse TOML config: {}", e))?,
            _ => {
                return Err(config_error!(
                    "Unsupported config file format. Use .json or .toml"
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| config_error!("Failed to serialize to JSON: {}", e))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| config_error!("Failed to serialize to TOML: {}", e))?,
            _ => {
                return Err(config_error!(
                    "Unsupported config file format. Use .json or .toml"
                ))
            }
        };

        std::fs::write(path, content)
            .map_err(|e| config_error!("Failed to write config file: {}", e))?;

        Ok(())
    }

    /// Load configuration from `GBDT_*` environment variables on top of the defaults
    pub fn load_from_environment() -> Result<Self> {
        let mut config = Config::default();
        config.apply_environment_overrides()?;
        Ok(config)
    }

    /// Override fields for which a `GBDT_*` environment variable is set
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        if let Some(depth) = env_value::<usize>("MAX_DEPTH")? {
            self.max_depth = depth;
        }
        if let Some(trees) = env_value::<usize>("NUM_TREES")? {
            self.num_trees = trees;
        }
        if let Some(size) = env_value::<usize>("MIN_LEAF_SIZE")? {
            self.min_leaf_size = size;
        }
        if let Some(threads) = env_value::<usize>("NUM_THREADS")? {
            self.num_threads = threads;
        }
        if let Some(verbose) = env_value::<bool>("VERBOSE")? {
            self.verbosity = if verbose {
                VerbosityLevel::Info
            } else {
                VerbosityLevel::Silent
            };
        }

        self.validate()
    }

    /// Get configuration as a parameter map (for logging)
    pub fn as_parameter_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("max_depth".to_string(), self.max_depth.to_string());
        map.insert("num_trees".to_string(), self.num_trees.to_string());
        map.insert("min_leaf_size".to_string(), self.min_leaf_size.to_string());
        map.insert("num_threads".to_string(), self.num_threads.to_string());
        map.insert("verbosity".to_string(), self.verbosity.to_string());
        map
    }
}

fn env_value<T: FromStr>(suffix: &str) -> Result<Option<T>> {
    let name = format!("{}{}", ENV_PREFIX, suffix);
    match std::env::var(&name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| config_error!("Invalid {}: {:?}", name, val)),
        Err(_) => Ok(None),
    }
}

/// Configuration builder for fluent configuration creation
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
    validation_errors: Vec<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the depth of every tree
    pub fn max_depth(mut self, depth: usize) -> Self {
        if depth < 1 || depth > MAX_SUPPORTED_DEPTH {
            self.validation_errors.push(format!(
                "max_depth must be in range [1, {}]",
                MAX_SUPPORTED_DEPTH
            ));
        }
        self.config.max_depth = depth;
        self
    }

    /// Set the number of trees
    pub fn num_trees(mut self, trees: usize) -> Self {
        if trees < 1 {
            self.validation_errors
                .push("num_trees must be at least 1".to_string());
        }
        self.config.num_trees = trees;
        self
    }

    /// Set the minimum number of active instances a leaf needs to keep growing
    pub fn min_leaf_size(mut self, size: usize) -> Self {
        if size < 1 {
            self.validation_errors
                .push("min_leaf_size must be at least 1".to_string());
        }
        self.config.min_leaf_size = size;
        self
    }

    /// Set the number of worker threads (0 = all cores)
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Set the verbosity level
    pub fn verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    /// Turn per-round progress reporting on or off
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbosity = if verbose {
            VerbosityLevel::Info
        } else {
            VerbosityLevel::Silent
        };
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        if !self.validation_errors.is_empty() {
            return Err(config_error!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            ));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
