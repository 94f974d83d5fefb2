use async_trait::async_trait;
use churn_structs::{ChurnError, CustomerScore, FeatureRecord, ModelRun, NewModelRun};

/// Persistent tabular store holding the feature mart and run outputs.
///
/// Calls are awaited one at a time; implementations need not support
/// concurrent writers.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Column names of the feature table, lower-cased, in table order.
    async fn feature_columns(&self) -> Result<Vec<String>, ChurnError>;

    /// Every feature row, ordered by `customer_id`.
    async fn fetch_features(&self) -> Result<Vec<FeatureRecord>, ChurnError>;

    /// Replaces the whole feature table. Returns the number of rows written.
    async fn replace_features(&self, records: &[FeatureRecord]) -> Result<u64, ChurnError>;

    /// Appends one run record; the store assigns `ran_at`.
    async fn insert_model_run(&self, run: &NewModelRun) -> Result<ModelRun, ChurnError>;

    /// Appends a batch of scores. Returns the number of rows written.
    async fn insert_scores(&self, scores: &[CustomerScore]) -> Result<u64, ChurnError>;

    /// Releases the connection. Later calls fail.
    async fn close(&self);
}
