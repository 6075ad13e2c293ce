//! Executor Module
//!
//! The seam between repositories and the backing document store.
//! A `DatabaseExecutor` hands a `Collection` to a callback and returns
//! whatever the callback returns; repositories never hold a handle to the
//! store themselves.
//!
//! Two implementations:
//! - `MemoryExecutor`: process-local collections, used by tests and tooling
//! - `PgExecutor`: one JSONB table per collection in Postgres

pub mod memory;
pub mod postgres;

pub use memory::MemoryExecutor;
pub use postgres::PgExecutor;

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

use crate::error::StoreError;
use crate::query::{Document, Filter, FindOptions, Update};

/// Boxed future borrowed from a collection handle
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Operations available on a single named collection
#[async_trait]
pub trait Collection: Send + Sync {
    /// Insert a new document. Fails with `Duplicate` if its `_id` exists.
    async fn insert_one(&self, doc: Document) -> Result<(), StoreError>;

    /// Count documents matching the filter
    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Find matching documents, sorted and windowed by `options`
    async fn find(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// First matching document in natural order
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError>;

    /// Apply an update to the document with this id.
    /// Fails with `NotFound` if no document has that id.
    async fn update_by_id(&self, id: Uuid, update: &Update) -> Result<(), StoreError>;
}

/// Runs callbacks against named collections
#[async_trait]
pub trait DatabaseExecutor: Send + Sync {
    /// Open `collection`, run `f` with it and return its result unchanged.
    async fn execute<T, F>(&self, collection: &str, f: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c dyn Collection) -> BoxFuture<'c, Result<T, StoreError>> + Send;
}

/// Collection names double as table names, so keep them to `[a-z_][a-z0-9_]*`
pub fn validate_collection_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid_head && valid_tail && name.len() <= 63 {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names() {
        assert!(validate_collection_name("heroes").is_ok());
        assert!(validate_collection_name("_audit_2").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("Heroes").is_err());
        assert!(validate_collection_name("2heroes").is_err());
        assert!(validate_collection_name("heroes; DROP TABLE x").is_err());
        assert!(validate_collection_name(&"a".repeat(64)).is_err());
    }
}
