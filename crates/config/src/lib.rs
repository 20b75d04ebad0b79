//! Configuration management for the segmentation service
//!
//! Provides:
//! - Layered settings loading (defaults, config files, environment variables)
//! - Typed configuration sections for every pipeline stage
//! - Validation with descriptive errors

pub mod settings;

pub use settings::{
    load_settings, CacheConfig, InterpreterConfig, QueryTuning, RuntimeEnvironment,
    ScoringWeights, SegmentationLimits, ServerConfig, Settings, WarehouseConfig,
};

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
