//! Heroes Store
//!
//! Persistence for heroes on top of a document collection.
//!
//! Layers:
//! - `query`: typed filters, updates and find options
//! - `executor`: the `DatabaseExecutor` seam plus in-memory and Postgres backends
//! - `repository`: hero create/list/retrieve/delete/update
//! - `db` and `config`: Postgres pool setup and migrations

pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod query;
pub mod repository;

pub use config::StoreConfig;
pub use error::{HeroError, StoreError};
pub use executor::{DatabaseExecutor, MemoryExecutor, PgExecutor};
pub use repository::hero_repository;
