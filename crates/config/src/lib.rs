//! Configuration management for the wealth-management RAG pipeline.
//!
//! Supports loading configuration from YAML files and environment
//! variables (`ADVISOR_RAG` prefix), layered highest-priority-last.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, IntentClassifierMode, ObservabilityConfig, PipelineConfig, RuntimeEnvironment,
    ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for advisor_rag_core::Error {
    fn from(err: ConfigError) -> Self {
        advisor_rag_core::Error::Configuration(err.to_string())
    }
}
