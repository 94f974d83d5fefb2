//! Training logic for the churn classifier.

use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::activation::log_sigmoid;
use burn::tensor::backend::AutodiffBackend;
use churn_structs::{ChurnError, FeatureRecord, FeatureSchema};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dataset::{ChurnBatch, ChurnBatcher, ChurnDataset};
use crate::preprocess::FittedPreprocessor;
use crate::{ChurnPipeline, LogisticModel, TrainingConfig};

/// Iterations between progress logs.
const LOG_EVERY: usize = 100;

/// Outcome of the optimization loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    /// Optimizer steps taken.
    pub iterations: usize,
    /// Regularized training loss at the last step.
    pub final_loss: f64,
    /// False when `max_iter` was reached before the loss settled.
    pub converged: bool,
}

/// Fits preprocessing and the classifier on the training split.
///
/// Optimizes class-weighted binary cross-entropy plus an L2 penalty on the
/// weights with full-batch Adam. Reaching `max_iter` without converging is
/// logged and reported, not an error.
///
/// # Errors
///
/// Returns an error if the inputs are empty or misaligned, preprocessing
/// fails, or the loss stops being finite.
pub fn fit<B: AutodiffBackend>(
    records: &[&FeatureRecord],
    labels: &[u8],
    schema: &FeatureSchema,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<ChurnPipeline<B::InnerBackend>, ChurnError> {
    if records.len() != labels.len() {
        return Err(ChurnError::InsufficientData(format!(
            "{} records but {} labels",
            records.len(),
            labels.len()
        )));
    }

    let preprocessor = FittedPreprocessor::fit(schema, records)?;
    let dataset = ChurnDataset::encode(&preprocessor, records, labels)?;

    let batcher = ChurnBatcher::<B>::new(device.clone());
    let batch = batcher.batch(dataset.items());

    let penalty_scale = 1.0 / (2.0 * config.inverse_regularization * records.len() as f64);

    let mut model = LogisticModel::<B>::new(device, preprocessor.width());
    let mut optimizer = AdamConfig::new().init();

    let mut report = TrainingReport {
        iterations: 0,
        final_loss: f64::NAN,
        converged: false,
    };
    let mut previous_loss: Option<f64> = None;

    for iteration in 1..=config.max_iter {
        let loss = regularized_loss(&model, &batch, penalty_scale);
        let loss_value = scalar(loss.clone())?;

        if !loss_value.is_finite() {
            return Err(ChurnError::Model(format!(
                "training loss is {loss_value} at iteration {iteration}"
            )));
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optimizer.step(config.learning_rate, model, grads);

        report.iterations = iteration;
        report.final_loss = loss_value;

        if iteration % LOG_EVERY == 0 {
            debug!(iteration, loss = loss_value, "Training progress");
        }

        if let Some(previous) = previous_loss
            && (previous - loss_value).abs() <= config.tolerance * loss_value.max(1.0)
        {
            report.converged = true;
            break;
        }
        previous_loss = Some(loss_value);
    }

    if report.converged {
        info!(
            iterations = report.iterations,
            loss = report.final_loss,
            features = preprocessor.width(),
            "Classifier converged"
        );
    } else {
        warn!(
            max_iter = config.max_iter,
            loss = report.final_loss,
            "Classifier did not converge; using last iterate"
        );
    }

    Ok(ChurnPipeline::new(
        preprocessor,
        model.valid(),
        device.clone(),
        report,
    ))
}

/// Weighted mean cross-entropy plus `penalty_scale * ||w||²`.
fn regularized_loss<B: Backend>(
    model: &LogisticModel<B>,
    batch: &ChurnBatch<B>,
    penalty_scale: f64,
) -> Tensor<B, 1> {
    let logits = model.forward(batch.inputs.clone());

    let positive = batch.targets.clone() * log_sigmoid(logits.clone());
    let negative = batch.targets.clone().neg().add_scalar(1.0) * log_sigmoid(logits.neg());
    let cross_entropy = ((positive + negative) * batch.weights.clone()).neg().mean();

    cross_entropy + model.weight_penalty().mul_scalar(penalty_scale)
}

/// Reads a one-element tensor.
pub(crate) fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> Result<f64, ChurnError> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| ChurnError::Model(format!("cannot read tensor: {e:?}")))?
        .first()
        .copied()
        .map(f64::from)
        .ok_or_else(|| ChurnError::Model("empty loss tensor".to_string()))
}
