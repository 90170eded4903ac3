//! Error types for the comments engine

use serde_json::json;
use thiserror::Error;

/// Main error type for the comments engine
#[derive(Debug, Error)]
pub enum CommentsError {
    /// Single-record lookup yielded nothing
    #[error("{0}")]
    NotFound(String),

    /// Relation target is not an enabled collection
    #[error("Action not allowed for collection '{collection}'. Use one of: {}", .allowed.join(", "))]
    Forbidden {
        collection: String,
        allowed: Vec<String>,
    },

    /// Content rejected by the moderation filter
    #[error("Bad language used! Please polite your comment...")]
    PolicyViolation { original: String, filtered: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed query or relation input
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Record store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CommentsError>,
    },
}

impl CommentsError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CommentsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// HTTP-style status code for the controller layer
    pub fn status_code(&self) -> u16 {
        match self {
            CommentsError::NotFound(_) => 404,
            CommentsError::Forbidden { .. } => 403,
            CommentsError::PolicyViolation { .. }
            | CommentsError::InvalidQuery(_)
            | CommentsError::Validation(_) => 400,
            CommentsError::WithContext { source, .. } => source.status_code(),
            _ => 500,
        }
    }

    /// Structured detail payload, when the error carries one
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CommentsError::PolicyViolation { original, filtered } => Some(json!({
                "content": { "original": original, "filtered": filtered }
            })),
            CommentsError::Forbidden { allowed, .. } => Some(json!({ "allowed": allowed })),
            CommentsError::WithContext { source, .. } => source.details(),
            _ => None,
        }
    }
}

/// Result type alias for the comments engine
pub type Result<T> = std::result::Result<T, CommentsError>;
