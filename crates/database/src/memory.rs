use async_trait::async_trait;
use chrono::Utc;
use churn_structs::{ChurnError, CustomerScore, FEATURE_SCHEMA_V1, FeatureRecord, ModelRun, NewModelRun};
use tokio::sync::RwLock;

use crate::store::FeatureStore;

#[derive(Debug, Default)]
struct Tables {
    features: Vec<FeatureRecord>,
    runs: Vec<ModelRun>,
    scores: Vec<CustomerScore>,
    closed: bool,
}

/// In-process [`FeatureStore`] for local runs and tests.
///
/// Mirrors the Postgres store's ordering and duplicate-run rules.
#[derive(Debug)]
pub struct MemoryFeatureStore {
    columns: Vec<String>,
    tables: RwLock<Tables>,
}

impl Default for MemoryFeatureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFeatureStore {
    /// Creates an empty store whose feature table has the v1 columns.
    #[must_use]
    pub fn new() -> Self {
        Self::with_columns(FEATURE_SCHEMA_V1.column_names().map(str::to_string).collect())
    }

    /// Creates an empty store reporting the given feature columns.
    #[must_use]
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Every run written so far, in insertion order.
    pub async fn runs(&self) -> Vec<ModelRun> {
        self.tables.read().await.runs.clone()
    }

    /// Every score written so far, in insertion order.
    pub async fn scores(&self) -> Vec<CustomerScore> {
        self.tables.read().await.scores.clone()
    }

    async fn ensure_open(&self) -> Result<(), ChurnError> {
        if self.tables.read().await.closed {
            return Err(ChurnError::StoreIo(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl FeatureStore for MemoryFeatureStore {
    async fn feature_columns(&self) -> Result<Vec<String>, ChurnError> {
        self.ensure_open().await?;
        Ok(self.columns.iter().map(|c| c.to_lowercase()).collect())
    }

    async fn fetch_features(&self) -> Result<Vec<FeatureRecord>, ChurnError> {
        self.ensure_open().await?;
        let mut records = self.tables.read().await.features.clone();
        // Stable, so duplicate ids keep load order like `row_ordinal` does.
        records.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
        Ok(records)
    }

    async fn replace_features(&self, records: &[FeatureRecord]) -> Result<u64, ChurnError> {
        self.ensure_open().await?;
        self.tables.write().await.features = records.to_vec();
        Ok(records.len() as u64)
    }

    async fn insert_model_run(&self, run: &NewModelRun) -> Result<ModelRun, ChurnError> {
        self.ensure_open().await?;
        let mut tables = self.tables.write().await;

        if tables.runs.iter().any(|r| r.run_id == run.run_id) {
            return Err(ChurnError::StoreIo(sqlx::Error::Protocol(format!(
                "duplicate run_id {}",
                run.run_id
            ))));
        }

        let stored = ModelRun {
            run_id: run.run_id,
            ran_at: Utc::now(),
            model_name: run.model_name.clone(),
            train_rows: run.train_rows,
            test_rows: run.test_rows,
            roc_auc: run.roc_auc,
            pr_auc: run.pr_auc,
            chosen_threshold: run.chosen_threshold,
            notes: run.notes.clone(),
        };
        tables.runs.push(stored.clone());

        Ok(stored)
    }

    async fn insert_scores(&self, scores: &[CustomerScore]) -> Result<u64, ChurnError> {
        self.ensure_open().await?;
        let mut tables = self.tables.write().await;

        if let Some(orphan) = scores
            .iter()
            .find(|s| !tables.runs.iter().any(|r| r.run_id == s.run_id))
        {
            return Err(ChurnError::StoreIo(sqlx::Error::Protocol(format!(
                "score references unknown run_id {}",
                orphan.run_id
            ))));
        }

        tables.scores.extend_from_slice(scores);
        Ok(scores.len() as u64)
    }

    async fn close(&self) {
        self.tables.write().await.closed = true;
    }
}
