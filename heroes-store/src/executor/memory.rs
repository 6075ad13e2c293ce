//! In-memory executor
//!
//! Collections live in a shared map behind an async `RwLock`. Documents keep
//! insertion order, which is also the tiebreak when sort keys compare equal.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BoxFuture, Collection, DatabaseExecutor, validate_collection_name};
use crate::error::StoreError;
use crate::query::{Document, Filter, FindOptions, Update, document_id};

type Collections = Arc<RwLock<HashMap<String, Vec<Document>>>>;

/// Executor backed by process memory
///
/// Cloning shares the underlying collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    collections: Collections,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored in a collection, removed ones included
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DatabaseExecutor for MemoryExecutor {
    async fn execute<T, F>(&self, collection: &str, f: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c dyn Collection) -> BoxFuture<'c, Result<T, StoreError>> + Send,
    {
        validate_collection_name(collection)?;

        let handle = MemoryCollection {
            name: collection.to_string(),
            collections: Arc::clone(&self.collections),
        };
        let handle: &dyn Collection = &handle;

        f(handle).await
    }
}

struct MemoryCollection {
    name: String,
    collections: Collections,
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn insert_one(&self, doc: Document) -> Result<(), StoreError> {
        let id = document_id(&doc)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(self.name.clone()).or_default();

        if docs.iter().any(|d| document_id(d).ok() == Some(id)) {
            return Err(StoreError::Duplicate(id.to_string()));
        }

        docs.push(doc);
        Ok(())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        let count = collections
            .get(&self.name)
            .map_or(0, |docs| docs.iter().filter(|d| filter.matches(d)).count());
        Ok(count as u64)
    }

    async fn find(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&self.name) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> = docs.iter().filter(|d| filter.matches(d)).collect();

        // sort_by is stable, so equal keys keep insertion order
        matched.sort_by(|a, b| {
            options
                .sort
                .iter()
                .map(|key| key.compare(a, b))
                .find(|ord| ord.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(matched.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&self.name)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn update_by_id(&self, id: Uuid, update: &Update) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(&self.name)
            .and_then(|docs| docs.iter_mut().find(|d| Filter::Id(id).matches(d)))
            .ok_or(StoreError::NotFound)?;

        update.apply(doc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{SortKey, to_document};
    use serde_json::json;

    fn doc(id: Uuid, name: &str, rank: u64) -> Document {
        to_document(&json!({ "_id": id.to_string(), "name": name, "rank": rank })).unwrap()
    }

    async fn seed(executor: &MemoryExecutor, docs: Vec<Document>) {
        for d in docs {
            executor
                .execute("items", move |coll| Box::pin(async move { coll.insert_one(d).await }))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let executor = MemoryExecutor::new();
        let id = Uuid::new_v4();
        seed(&executor, vec![doc(id, "a", 1)]).await;

        let found = executor
            .execute("items", move |coll| {
                Box::pin(async move { coll.find_one(&Filter::id(id)).await })
            })
            .await
            .unwrap();

        assert_eq!(found.unwrap()["name"], "a");
        assert_eq!(executor.len("items").await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let executor = MemoryExecutor::new();
        let id = Uuid::new_v4();
        seed(&executor, vec![doc(id, "a", 1)]).await;

        let again = doc(id, "b", 2);
        let result = executor
            .execute("items", move |coll| Box::pin(async move { coll.insert_one(again).await }))
            .await;

        assert!(matches!(result, Err(StoreError::Duplicate(_))));
        assert_eq!(executor.len("items").await, 1);
    }

    #[tokio::test]
    async fn test_find_sorts_skips_and_limits() {
        let executor = MemoryExecutor::new();
        seed(
            &executor,
            vec![
                doc(Uuid::new_v4(), "c", 3),
                doc(Uuid::new_v4(), "a", 1),
                doc(Uuid::new_v4(), "d", 4),
                doc(Uuid::new_v4(), "b", 2),
            ],
        )
        .await;

        let options = FindOptions {
            sort: vec![SortKey::descending("rank")],
            skip: 1,
            limit: Some(2),
        };
        let docs = executor
            .execute("items", move |coll| {
                Box::pin(async move { coll.find(&Filter::All, &options).await })
            })
            .await
            .unwrap();

        let names: Vec<_> = docs.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_unsorted_find_keeps_insertion_order() {
        let executor = MemoryExecutor::new();
        seed(
            &executor,
            vec![doc(Uuid::new_v4(), "z", 1), doc(Uuid::new_v4(), "y", 1)],
        )
        .await;

        let docs = executor
            .execute("items", |coll| {
                Box::pin(async move { coll.find(&Filter::All, &FindOptions::default()).await })
            })
            .await
            .unwrap();

        assert_eq!(docs[0]["name"], "z");
        assert_eq!(docs[1]["name"], "y");
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let executor = MemoryExecutor::new();
        let update = Update::set(to_document(&json!({ "name": "x" })).unwrap());

        let result = executor
            .execute("items", move |coll| {
                Box::pin(async move { coll.update_by_id(Uuid::new_v4(), &update).await })
            })
            .await;

        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_existing_document() {
        let executor = MemoryExecutor::new();
        let id = Uuid::new_v4();
        seed(&executor, vec![doc(id, "a", 1)]).await;

        let update = Update::set(to_document(&json!({ "name": "renamed" })).unwrap());
        executor
            .execute("items", move |coll| {
                Box::pin(async move { coll.update_by_id(id, &update).await })
            })
            .await
            .unwrap();

        let count = executor
            .execute("items", |coll| {
                Box::pin(async move { coll.count(&Filter::eq("name", "renamed")).await })
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_invalid_collection_name() {
        let executor = MemoryExecutor::new();
        let result = executor
            .execute("Bad Name", |coll| {
                Box::pin(async move { coll.count(&Filter::All).await })
            })
            .await;

        assert!(matches!(result, Err(StoreError::InvalidCollection(_))));
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let executor = MemoryExecutor::new();
        seed(&executor, vec![doc(Uuid::new_v4(), "a", 1)]).await;

        let count = executor
            .execute("others", |coll| {
                Box::pin(async move { coll.count(&Filter::All).await })
            })
            .await
            .unwrap();

        assert_eq!(count, 0);
        assert_eq!(executor.len("others").await, 0);
    }
}
