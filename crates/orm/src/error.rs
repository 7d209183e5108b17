//! Error types for the ORM system
//!
//! Schema and key errors point at a defect in an entity declaration and are
//! not meant to be recovered from. Query and backend errors are surfaced to
//! the caller, who decides whether to fall back or reject the request.

use std::time::Duration;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Entity or table declaration is invalid
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Composite key could not be encoded or decoded
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    /// Lookup could not be planned or returned an unexpected cardinality
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
    /// Storage backend failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ModelError {
    /// Whether the caller can reasonably handle this error at runtime.
    ///
    /// Schema, key and configuration errors are declaration bugs.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ModelError::Schema(_) | ModelError::Key(_) | ModelError::Configuration(_) => false,
            ModelError::Query(_) | ModelError::Backend(_) | ModelError::Serialization(_) => true,
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

/// Errors raised while declaring an entity schema or table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("variable '{variable}' is already assigned to key '{key}'")]
    DuplicateComponent { key: String, variable: String },

    #[error("key '{key}' can't have more than one prefix")]
    MultiplePrefixes { key: String },

    #[error("table '{table}' has no primary key definition")]
    MissingPrimaryKey { table: String },

    #[error("table '{table}' already declares a primary key")]
    DuplicatePrimaryKey { table: String },

    #[error("'{attribute}' is not an attribute of entity '{entity}'")]
    UnknownAttribute { entity: String, attribute: String },
}

/// Errors raised by the composite key codec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("key '{key}' should have at least one attribute")]
    EmptyKey { key: String },

    #[error("key '{key}' should have a prefix on its first component")]
    MissingPrefix { key: String },

    #[error("'{key}' is not a key of this entity")]
    UnknownKey { key: String },

    #[error("value '{value}' of key '{key}' does not match its prefix")]
    MalformedKey { key: String, value: String },
}

/// Errors raised while planning or executing a lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("no key or index can answer this lookup")]
    NoQueryableKey,

    #[error("expected at most one item, found {count}")]
    AmbiguousResult { count: usize },
}

/// Errors reported by a storage backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let schema: ModelError = SchemaError::MultiplePrefixes { key: "PK".into() }.into();
        assert!(!schema.is_recoverable());

        let key: ModelError = KeyError::EmptyKey { key: "PK".into() }.into();
        assert!(!key.is_recoverable());

        let query: ModelError = QueryError::NoQueryableKey.into();
        assert!(query.is_recoverable());

        let backend: ModelError = BackendError::Timeout { after: Duration::from_secs(1) }.into();
        assert!(backend.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err: ModelError = SchemaError::DuplicateComponent {
            key: "PK".into(),
            variable: "userId".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Schema error: variable 'userId' is already assigned to key 'PK'"
        );

        let err: ModelError = QueryError::AmbiguousResult { count: 2 }.into();
        assert_eq!(err.to_string(), "Query error: expected at most one item, found 2");
    }
}
