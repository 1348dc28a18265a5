//! Error types for field tree and query plan building
//!
//! Every failure here is a configuration or programmer error. Nothing is
//! retried and nothing is swallowed on the way up the recursion.

use thiserror::Error;

/// Result type alias for auto-query operations
pub type AutoQueryResult<T> = Result<T, AutoQueryError>;

/// Error types for auto-query operations
#[derive(Debug, Error)]
pub enum AutoQueryError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Entity type '{0}' is not registered with the metadata source")]
    UnknownEntity(String),

    #[error("Entity type '{0}' is abstract and cannot be queried")]
    AbstractEntity(String),

    #[error("Field '{field}' at path '{path}' is tagged {kind} but has no resolvable entity type")]
    UnresolvedRelation {
        field: String,
        path: String,
        kind: String,
    },

    #[error("Schema '{0}' has no entity type binding")]
    MissingEntityBinding(String),

    #[error("Customized prefetch at '{path}' queries '{found}' but the relation targets '{expected}'")]
    PrefetchConflict {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Several schema fields fetch '{path}'; their nested requirements cannot be merged")]
    AmbiguousPrefetch { path: String },

    #[error("Schema nesting exceeds the maximum depth of {max_depth} at field '{field}'")]
    MaxDepthExceeded { field: String, max_depth: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AutoQueryError {
    /// Returns true for errors caused by schema or entity misconfiguration
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Yaml(_) | Self::Json(_))
    }
}
