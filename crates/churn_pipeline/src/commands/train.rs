//! Train command - fits the classifier on the feature mart and scores every customer.

use anyhow::Result;
use burn::backend::ndarray::NdArrayDevice;
use churn_structs::FEATURE_SCHEMA_V1;
use database::{FeatureStore, RunRecorder, RunSummary, load_feature_table};
use ml_model::{TrainingConfig, train_and_evaluate};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::TrainBackend;

/// Model name recorded when none is given.
pub const DEFAULT_MODEL_NAME: &str = "logreg_ohe_v1";

const RUN_NOTES: &str =
    "Feature mart → logistic regression pipeline; threshold chosen by max-F1 on PR curve.";

/// What a training run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub model_name: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub roc_auc: f64,
    pub pr_auc: f64,
    pub threshold: f64,
    pub scored_rows: u64,
    pub converged: bool,
}

/// Runs the train command.
///
/// Loads the mart, fits and evaluates the pipeline, then writes the run
/// record followed by one score per customer. Nothing is written if loading
/// or training fails.
///
/// # Errors
///
/// Returns an error if the mart is unusable, training fails, or a store write
/// fails.
pub async fn run<S: FeatureStore + ?Sized>(
    store: &S,
    model_name: &str,
    config: &TrainingConfig,
    device: &NdArrayDevice,
) -> Result<RunOutcome> {
    let recorder = RunRecorder::new(model_name);
    info!(run_id = %recorder.run_id(), model_name, "Starting training run");

    let records = load_feature_table(store, &FEATURE_SCHEMA_V1).await?;
    if records.is_empty() {
        anyhow::bail!("Feature table is empty. Run the ingest command first.");
    }

    let evaluation = train_and_evaluate::<TrainBackend>(&records, &FEATURE_SCHEMA_V1, config, device)?;
    let probas = evaluation.pipeline.predict_proba(&records)?;

    let summary = RunSummary {
        train_rows: evaluation.train_rows,
        test_rows: evaluation.test_rows,
        roc_auc: evaluation.roc_auc,
        pr_auc: evaluation.pr_auc,
        chosen_threshold: evaluation.threshold,
        notes: RUN_NOTES.to_string(),
    };
    recorder.record_run(store, &summary).await?;

    let predictions: Vec<(&str, f64)> = records
        .iter()
        .map(|r| r.customer_id.as_str())
        .zip(probas)
        .collect();
    let scored_rows = recorder
        .record_scores(store, &predictions, evaluation.threshold)
        .await?;

    info!(
        run_id = %recorder.run_id(),
        roc_auc = %format!("{:.4}", evaluation.roc_auc),
        pr_auc = %format!("{:.4}", evaluation.pr_auc),
        threshold = %format!("{:.4}", evaluation.threshold),
        "Model trained, evaluated, and scores written"
    );

    Ok(RunOutcome {
        run_id: recorder.run_id(),
        model_name: model_name.to_string(),
        train_rows: evaluation.train_rows,
        test_rows: evaluation.test_rows,
        roc_auc: evaluation.roc_auc,
        pr_auc: evaluation.pr_auc,
        threshold: evaluation.threshold,
        scored_rows,
        converged: evaluation.pipeline.report().converged,
    })
}
