//! Postgres executor
//!
//! Each collection is a table of `(id UUID PRIMARY KEY, body JSONB)`.
//! Filters, sorts and windows compile to SQL through `QueryBuilder`; every
//! field name and value is a bound parameter, and the table name has already
//! passed `validate_collection_name`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{BoxFuture, Collection, DatabaseExecutor, validate_collection_name};
use crate::error::StoreError;
use crate::query::{Document, Filter, FindOptions, SortDirection, Update, document_id};

/// Executor backed by a Postgres pool
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseExecutor for PgExecutor {
    async fn execute<T, F>(&self, collection: &str, f: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c dyn Collection) -> BoxFuture<'c, Result<T, StoreError>> + Send,
    {
        validate_collection_name(collection)?;

        let handle = PgCollection {
            pool: &self.pool,
            table: collection,
        };
        let handle: &dyn Collection = &handle;

        f(handle).await
    }
}

struct PgCollection<'a> {
    pool: &'a PgPool,
    table: &'a str,
}

#[async_trait]
impl Collection for PgCollection<'_> {
    async fn insert_one(&self, doc: Document) -> Result<(), StoreError> {
        let id = document_id(&doc)?;
        let sql = format!(r#"INSERT INTO "{}" (id, body) VALUES ($1, $2)"#, self.table);

        sqlx::query(&sql)
            .bind(id)
            .bind(Value::Object(doc))
            .execute(self.pool)
            .await
            .map_err(|err| {
                let unique = err
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if unique {
                    StoreError::Duplicate(id.to_string())
                } else {
                    StoreError::Database(err)
                }
            })?;

        Ok(())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut qb = count_query(self.table, filter);
        let count: i64 = qb.build_query_scalar().fetch_one(self.pool).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn find(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let mut qb = select_query(self.table, filter, options);
        let rows: Vec<Value> = qb.build_query_scalar().fetch_all(self.pool).await?;
        rows.into_iter().map(into_document).collect()
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let options = FindOptions {
            limit: Some(1),
            ..Default::default()
        };
        let mut qb = select_query(self.table, filter, &options);
        let row: Option<Value> = qb.build_query_scalar().fetch_optional(self.pool).await?;
        row.map(into_document).transpose()
    }

    async fn update_by_id(&self, id: Uuid, update: &Update) -> Result<(), StoreError> {
        let sql = format!(r#"UPDATE "{}" SET body = body || $1 WHERE id = $2"#, self.table);

        let result = sqlx::query(&sql)
            .bind(Value::Object(update.fields().clone()))
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

// =============================================================================
// SQL Compilation
// =============================================================================

fn count_query(table: &str, filter: &Filter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(r#"SELECT COUNT(*) FROM "{table}" WHERE "#));
    push_filter(&mut qb, filter);
    qb
}

fn select_query(
    table: &str,
    filter: &Filter,
    options: &FindOptions,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(r#"SELECT body FROM "{table}" WHERE "#));
    push_filter(&mut qb, filter);

    // A missing field is SQL NULL; order it with JSON null, below every value
    qb.push(" ORDER BY ");
    for key in &options.sort {
        let direction = match key.direction {
            SortDirection::Ascending => " ASC NULLS FIRST, ",
            SortDirection::Descending => " DESC NULLS LAST, ",
        };
        qb.push("body -> ")
            .push_bind(key.field.clone())
            .push(direction);
    }
    // Stable pages need a total order
    qb.push("id ASC");

    if options.skip > 0 {
        qb.push(" OFFSET ").push_bind(to_i64(options.skip));
    }
    if let Some(limit) = options.limit {
        qb.push(" LIMIT ").push_bind(to_i64(limit));
    }

    qb
}

fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            qb.push("TRUE");
        }
        Filter::Id(id) => {
            qb.push("id = ").push_bind(*id);
        }
        Filter::Eq(field, value) => {
            qb.push("body -> ")
                .push_bind(field.clone())
                .push(" = ")
                .push_bind(value.clone());
        }
        Filter::In(field, values) => {
            qb.push("body -> ")
                .push_bind(field.clone())
                .push(" ?| ")
                .push_bind(values.clone());
        }
        Filter::And(filters) if filters.is_empty() => {
            qb.push("TRUE");
        }
        Filter::And(filters) => {
            qb.push("(");
            for (i, f) in filters.iter().enumerate() {
                if i > 0 {
                    qb.push(" AND ");
                }
                push_filter(qb, f);
            }
            qb.push(")");
        }
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn into_document(value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::InvalidDocument(format!(
            "stored body is not an object: {other}"
        ))),
    }
}
