use async_trait::async_trait;
use churn_structs::{ChurnError, CustomerScore, FEATURE_SCHEMA_V1, FeatureRecord, ModelRun, NewModelRun};
use sqlx::PgPool;
use tracing::debug;

use crate::store::FeatureStore;
use crate::{customer_feature, model_run};

/// [`FeatureStore`] backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgFeatureStore {
    pool: PgPool,
}

impl PgFeatureStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl FeatureStore for PgFeatureStore {
    async fn feature_columns(&self) -> Result<Vec<String>, ChurnError> {
        Ok(customer_feature::fetch_feature_columns(&self.pool, FEATURE_SCHEMA_V1.table).await?)
    }

    async fn fetch_features(&self) -> Result<Vec<FeatureRecord>, ChurnError> {
        Ok(customer_feature::fetch_features(&self.pool).await?)
    }

    async fn replace_features(&self, records: &[FeatureRecord]) -> Result<u64, ChurnError> {
        let written = customer_feature::replace_features(&self.pool, records).await?;
        debug!(rows = written, "Replaced feature table");
        Ok(written)
    }

    async fn insert_model_run(&self, run: &NewModelRun) -> Result<ModelRun, ChurnError> {
        Ok(model_run::insert_model_run(&self.pool, run).await?)
    }

    async fn insert_scores(&self, scores: &[CustomerScore]) -> Result<u64, ChurnError> {
        let written = model_run::insert_customer_scores(&self.pool, scores).await?;
        debug!(rows = written, "Inserted customer scores");
        Ok(written)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
