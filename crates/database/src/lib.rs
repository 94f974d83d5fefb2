//! Feature store gateway.
//!
//! Reads and writes the feature mart, training runs, and per-customer scores
//! through the [`FeatureStore`] trait, backed by Postgres in production and by
//! memory for local runs and tests.

use churn_structs::{ChurnError, FeatureRecord, FeatureSchema};
use config::Config;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

mod customer_feature;
mod memory;
mod model_run;
mod postgres;
mod recorder;
mod store;

pub use memory::MemoryFeatureStore;
pub use postgres::PgFeatureStore;
pub use recorder::{RunRecorder, RunSummary, SCORED_AT_FORMAT};
pub use store::FeatureStore;

/// Creates a connection pool to the `PostgreSQL` database.
///
/// # Errors
///
/// Returns an error if the connection to the database fails.
pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns an error if running migrations fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Fetches the feature table after checking its columns against `schema`.
///
/// # Errors
///
/// Returns [`ChurnError::SchemaMismatch`] listing every missing column, or
/// [`ChurnError::StoreIo`] if the store cannot be read.
pub async fn load_feature_table<S: FeatureStore + ?Sized>(
    store: &S,
    schema: &FeatureSchema,
) -> Result<Vec<FeatureRecord>, ChurnError> {
    let columns = store.feature_columns().await?;
    schema.validate(&columns)?;

    let records = store.fetch_features().await?;
    info!(
        table = schema.table,
        schema_version = schema.version,
        rows = records.len(),
        "Loaded feature table"
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use churn_structs::FEATURE_SCHEMA_V1;

    use super::*;

    #[tokio::test]
    async fn test_load_feature_table_rejects_missing_columns() {
        let store = MemoryFeatureStore::with_columns(vec!["customer_id".to_string()]);

        let result = load_feature_table(&store, &FEATURE_SCHEMA_V1).await;

        let Err(ChurnError::SchemaMismatch { missing, .. }) = result else {
            panic!("expected schema mismatch");
        };
        assert!(missing.contains(&"churn_label".to_string()));
    }

    #[tokio::test]
    async fn test_load_feature_table_returns_records() {
        let store = MemoryFeatureStore::new();
        store
            .replace_features(&[memory::tests::record("B2", 1), memory::tests::record("A1", 0)])
            .await
            .unwrap();

        let records = load_feature_table(&store, &FEATURE_SCHEMA_V1).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].customer_id, "A1");
    }
}
