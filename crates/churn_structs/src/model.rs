use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Training run metadata stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModelRun {
    pub run_id: Uuid,
    pub ran_at: DateTime<Utc>,
    pub model_name: String,
    pub train_rows: i64,
    pub test_rows: i64,
    pub roc_auc: f64,
    pub pr_auc: f64,
    pub chosen_threshold: f64,
    pub notes: String,
}

/// Input for creating a new model run record.
///
/// `ran_at` is left to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewModelRun {
    pub run_id: Uuid,
    pub model_name: String,
    pub train_rows: i64,
    pub test_rows: i64,
    pub roc_auc: f64,
    pub pr_auc: f64,
    pub chosen_threshold: f64,
    pub notes: String,
}

/// One scored customer for one run. Plain scalars only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerScore {
    pub run_id: Uuid,
    pub customer_id: String,
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    pub scored_at: String,
    pub model_name: String,
    pub churn_proba: f64,
    pub churn_pred: i32,
}
