//! Error types for repoman

use thiserror::Error;

/// Result type alias for repoman operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for registry, data source and repository operations.
///
/// The query builder itself never fails; every variant here comes from the
/// layers around it.
#[derive(Debug, Error)]
pub enum OrmError {
    /// An entity was registered twice under the same name
    #[error("Entity already registered: {0}")]
    EntityAlreadyRegistered(String),

    /// An entity name was looked up but never registered
    #[error("Entity ({0}) is not registered")]
    EntityNotRegistered(String),

    /// The registered prototype is not of the requested type
    #[error("Entity ({name}) is not a {expected}")]
    EntityType { name: String, expected: &'static str },

    /// The data source refused or failed to execute a statement
    #[error("Query ({query}) not executed for ({entity}): {message}")]
    QueryFailed {
        query: String,
        entity: String,
        message: String,
    },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Failure reported by the underlying data source
    #[error("Data source error: {0}")]
    Source(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a data source error
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this error came from the entity registry
    pub fn is_registry_error(&self) -> bool {
        matches!(
            self,
            Self::EntityAlreadyRegistered(_) | Self::EntityNotRegistered(_) | Self::EntityType { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_failed_message_names_query_and_entity() {
        let err = OrmError::QueryFailed {
            query: "DELETE FROM users".to_string(),
            entity: "users".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Query (DELETE FROM users) not executed for (users): boom"
        );
    }

    #[test]
    fn registry_errors_are_classified() {
        assert!(OrmError::EntityNotRegistered("x".into()).is_registry_error());
        assert!(OrmError::EntityAlreadyRegistered("x".into()).is_registry_error());
        assert!(!OrmError::not_found("x").is_registry_error());
        assert!(OrmError::not_found("x").is_not_found());
    }
}
