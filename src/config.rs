//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - minilog.toml (default configuration)
//! - Environment variables (MINILOG_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # minilog.toml
//! [transform]
//! minimise = true
//! max_fixpoint_iterations = 10
//!
//! [transform.minimise_options]
//! merge_singleton_relations = false
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! MINILOG_TRANSFORM__MINIMISE=false
//! MINILOG_LOGGING__LEVEL=trace
//! ```

use crate::minimise::MinimiseOptions;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transformation pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Run the program minimisation pass
    #[serde(default = "default_true")]
    pub minimise: bool,

    /// Per-reduction toggles for the minimisation pass
    #[serde(default)]
    pub minimise_options: MinimiseOptions,

    /// Iteration bound for fixed-point transformations
    #[serde(default = "default_max_fixpoint_iterations")]
    pub max_fixpoint_iterations: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            minimise: true,
            minimise_options: MinimiseOptions::default(),
            max_fixpoint_iterations: default_max_fixpoint_iterations(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_fixpoint_iterations() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from minilog.toml plus MINILOG_* environment
    /// overrides; missing sources fall back to defaults
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("minilog.toml"))
            .merge(Env::prefixed("MINILOG_").split("__"))
            .extract()
    }
}
