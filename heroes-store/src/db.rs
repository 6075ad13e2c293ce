use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::StoreConfig;
use crate::executor::validate_collection_name;
use crate::repository::hero::HERO_COLLECTION;

pub async fn create_pool(config: &StoreConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    create_collection(pool, HERO_COLLECTION).await?;

    // Default list order and the superpower filter
    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_heroes_created ON "heroes" ((body -> 'created'))"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_heroes_superpowers ON "heroes" USING GIN ((body -> 'superpowers'))"#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Create the backing table for a document collection
pub async fn create_collection(pool: &PgPool, name: &str) -> Result<(), sqlx::Error> {
    validate_collection_name(name).map_err(|e| sqlx::Error::Configuration(e.into()))?;

    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{name}" (
            id UUID PRIMARY KEY,
            body JSONB NOT NULL
        )
        "#
    );
    sqlx::query(&sql).execute(pool).await?;

    tracing::debug!("Collection ready: {}", name);
    Ok(())
}
