//! Error types for `when` expression parsing

use oh_registries::RegistryError;
use thiserror::Error;

/// Failures that indicate a bug or a broken host rather than bad input
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("registry lookup failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("parser invariant violated: {0}")]
    Invariant(String),
}

/// Errors produced while turning an expression into trigger specs
#[derive(Debug, Error)]
pub enum ParseError {
    /// The token sequence is malformed or names something that does not exist
    #[error("when: '{expression}' could not be parsed: {reason}")]
    Grammar { expression: String, reason: String },

    /// Well-formed, but the target has the wrong type or a literal is invalid
    #[error("when: '{expression}' is not valid: {reason}")]
    Semantic { expression: String, reason: String },

    /// Not caused by the expression
    #[error("when: internal error while processing '{expression}': {source}")]
    Internal {
        expression: String,
        #[source]
        source: InternalError,
    },
}

impl ParseError {
    pub fn grammar(expression: &str, reason: impl Into<String>) -> Self {
        ParseError::Grammar {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub fn semantic(expression: &str, reason: impl Into<String>) -> Self {
        ParseError::Semantic {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub fn internal(expression: &str, source: impl Into<InternalError>) -> Self {
        ParseError::Internal {
            expression: expression.to_string(),
            source: source.into(),
        }
    }

    /// Bad input the caller can skip, as opposed to an internal failure
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ParseError::Internal { .. })
    }

    /// The expression that failed
    pub fn expression(&self) -> &str {
        match self {
            ParseError::Grammar { expression, .. }
            | ParseError::Semantic { expression, .. }
            | ParseError::Internal { expression, .. } => expression,
        }
    }

    /// Human-readable reason, without the expression
    pub fn reason(&self) -> String {
        match self {
            ParseError::Grammar { reason, .. } | ParseError::Semantic { reason, .. } => {
                reason.clone()
            }
            ParseError::Internal { source, .. } => source.to_string(),
        }
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
