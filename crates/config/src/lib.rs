//! Configuration management for the assistant
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default`, `config/{env}`)
//! - Environment variables (MURSHID__ prefix, `__` separator)
//!
//! Settings are passed explicitly to constructors; nothing here mutates the
//! process environment.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, load_settings_with_vars, AssistantConfig,
    ObservabilityConfig, RagConfig, Settings, WatsonxConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for murshid_core::Error {
    fn from(err: ConfigError) -> Self {
        murshid_core::Error::Config(err.to_string())
    }
}
