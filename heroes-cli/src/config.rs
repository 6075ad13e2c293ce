//! Configuration module
//!
//! Handles CLI configuration: store settings from the environment, with the
//! connection flags (which clap already fills from DATABASE_URL and
//! DATABASE_MAX_CONNECTIONS) applied on top.

use heroes_store::StoreConfig;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection settings
    pub store: StoreConfig,

    /// Create the collection tables before running the command
    pub migrate: bool,
}

impl Config {
    /// Environment settings with any flag overrides applied on top
    pub fn resolve(database_url: Option<String>, max_connections: Option<u32>, migrate: bool) -> Self {
        let mut store = StoreConfig::from_env();

        if let Some(url) = database_url {
            store = store.with_database_url(url);
        }
        if let Some(n) = max_connections {
            store = store.with_max_connections(n);
        }

        Self { store, migrate }
    }
}
