//! Registry error types

use thiserror::Error;

/// Errors that can occur in the registries
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Entry was not found
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// An entry with the same key already exists
    #[error("{kind} already registered: {name}")]
    Duplicate { kind: &'static str, name: String },

    /// An entry refers to something it cannot
    #[error("invalid {kind} '{name}': {reason}")]
    Invalid {
        kind: &'static str,
        name: String,
        reason: String,
    },

    /// A registry lock was poisoned by a panicking writer
    #[error("{0} registry lock poisoned")]
    Poisoned(&'static str),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
