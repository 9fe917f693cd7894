//! Error types for rules and rule configuration

use std::path::PathBuf;

use oh_registries::RegistryError;
use oh_triggers::{FactoryError, ParseError};
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading rule or registry files
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Registry snapshot could not be loaded
    #[error("invalid registry snapshot {path}: {source}")]
    Registry {
        path: PathBuf,
        #[source]
        source: RegistryError,
    },
}

/// Rule errors
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Rule not found: {0}")]
    NotFound(String),

    #[error("Rule already registered: {0}")]
    Duplicate(String),

    /// At least one trigger expression was rejected
    #[error("Rule '{0}' has invalid triggers")]
    InvalidTriggers(String),

    #[error("Trigger error: {0}")]
    Factory(#[from] FactoryError),

    /// Not caused by the rule definition
    #[error("Internal error: {0}")]
    Internal(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for rule operations
pub type RuleResult<T> = Result<T, RuleError>;
