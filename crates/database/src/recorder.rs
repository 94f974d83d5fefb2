//! Persistence of one training run and its scores.
//!
//! [`RunRecorder::record_run`] and [`RunRecorder::record_scores`] are separate
//! writes with no transaction spanning them. If the score write fails, the
//! run record stays behind without scores; nothing repairs it.

use chrono::{DateTime, Utc};
use churn_structs::{ChurnError, CustomerScore, ModelRun, NewModelRun};
use tracing::info;
use uuid::Uuid;

use crate::store::FeatureStore;

/// Layout of the `scored_at` string handed to the store.
pub const SCORED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Metrics and sizes describing one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub roc_auc: f64,
    pub pr_auc: f64,
    pub chosen_threshold: f64,
    pub notes: String,
}

/// Writes the outputs of a single training invocation.
#[derive(Debug, Clone)]
pub struct RunRecorder {
    run_id: Uuid,
    model_name: String,
}

impl RunRecorder {
    /// Starts a run with a fresh random identifier.
    #[must_use]
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            model_name: model_name.into(),
        }
    }

    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Inserts the run record.
    ///
    /// # Errors
    ///
    /// Returns an error if a row count does not fit the store or the insert fails.
    pub async fn record_run<S: FeatureStore + ?Sized>(
        &self,
        store: &S,
        summary: &RunSummary,
    ) -> Result<ModelRun, ChurnError> {
        let run = NewModelRun {
            run_id: self.run_id,
            model_name: self.model_name.clone(),
            train_rows: row_count(summary.train_rows)?,
            test_rows: row_count(summary.test_rows)?,
            roc_auc: summary.roc_auc,
            pr_auc: summary.pr_auc,
            chosen_threshold: summary.chosen_threshold,
            notes: summary.notes.clone(),
        };

        let stored = store.insert_model_run(&run).await?;
        info!(run_id = %stored.run_id, ran_at = %stored.ran_at, "Recorded model run");

        Ok(stored)
    }

    /// Builds one score per prediction, all stamped with `scored_at`.
    ///
    /// A customer is predicted to churn when its probability reaches `threshold`.
    #[must_use]
    pub fn build_scores(
        &self,
        predictions: &[(&str, f64)],
        threshold: f64,
        scored_at: DateTime<Utc>,
    ) -> Vec<CustomerScore> {
        let scored_at = scored_at.format(SCORED_AT_FORMAT).to_string();

        predictions
            .iter()
            .map(|&(customer_id, proba)| CustomerScore {
                run_id: self.run_id,
                customer_id: customer_id.to_string(),
                scored_at: scored_at.clone(),
                model_name: self.model_name.clone(),
                churn_proba: proba,
                churn_pred: i32::from(proba >= threshold),
            })
            .collect()
    }

    /// Scores every prediction now and bulk-inserts the batch.
    ///
    /// Must follow [`RunRecorder::record_run`].
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record_scores<S: FeatureStore + ?Sized>(
        &self,
        store: &S,
        predictions: &[(&str, f64)],
        threshold: f64,
    ) -> Result<u64, ChurnError> {
        let scores = self.build_scores(predictions, threshold, Utc::now());
        let written = store.insert_scores(&scores).await?;

        info!(run_id = %self.run_id, rows = written, "Recorded customer scores");

        Ok(written)
    }
}

fn row_count(rows: usize) -> Result<i64, ChurnError> {
    i64::try_from(rows).map_err(|_| ChurnError::Model(format!("row count {rows} does not fit i64")))
}
