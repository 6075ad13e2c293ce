//! Error types for the hero store

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, HeroError>;

/// Errors surfaced by a document collection or the executor running it
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document matched an operation that requires one
    #[error("document not found")]
    NotFound,

    /// A document with the same `_id` already exists
    #[error("duplicate document id: {0}")]
    Duplicate(String),

    /// Collection name is not a plain lowercase identifier
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),

    /// Document is not an object or lacks a usable `_id`
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Malformed sort key or similar query input
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors returned by the hero repository
#[derive(Debug, Error)]
pub enum HeroError {
    /// Caller supplied a malformed id or paging request
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No active hero with this id
    #[error("hero {0} not found")]
    NotFound(Uuid),

    /// The store call failed; `context` names the operation and query
    #[error("{context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl HeroError {
    pub fn persistence(context: impl Into<String>, source: StoreError) -> Self {
        Self::Persistence {
            context: context.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_message_carries_context() {
        let err = HeroError::persistence("db.heroes.count({})", StoreError::NotFound);
        assert_eq!(err.to_string(), "db.heroes.count({}): document not found");
        assert!(err.is_persistence());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_predicates() {
        assert!(HeroError::NotFound(Uuid::nil()).is_not_found());
        assert!(HeroError::InvalidArgument("x".into()).is_invalid_argument());
        assert!(!HeroError::InvalidArgument("x".into()).is_not_found());
    }
}
