//! ML model crate for churn prediction.
//!
//! This crate uses the Burn deep learning framework to define, train,
//! and run inference with a logistic-regression classifier over the
//! churn feature mart, and to pick the operating threshold from held-out
//! predictions.

use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::AutodiffBackend;
use churn_structs::{ChurnError, FeatureRecord, FeatureSchema};
use tracing::info;

pub mod dataset;
pub mod metrics;
mod pipeline;
pub mod preprocess;
pub mod split;
pub mod threshold;
pub mod training;

pub use pipeline::ChurnPipeline;
pub use preprocess::FittedPreprocessor;
pub use split::{Split, stratified_split};
pub use threshold::{PrecisionRecallCurve, choose_threshold_max_f1, precision_recall_curve};
pub use training::{TrainingReport, fit};

/// Configuration for training the classifier.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Share of rows held out for evaluation.
    pub test_size: f64,
    /// Seed of the train/test split.
    pub seed: u64,
    /// Upper bound on optimizer iterations.
    pub max_iter: usize,
    /// Learning rate for the optimizer.
    pub learning_rate: f64,
    /// Loss change, relative to `max(1, loss)`, under which training stops.
    pub tolerance: f64,
    /// Inverse L2 regularization strength (`C`).
    pub inverse_regularization: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            max_iter: 2000,
            learning_rate: 0.05,
            tolerance: 1e-7,
            inverse_regularization: 1.0,
        }
    }
}

/// Binary logistic-regression model.
///
/// A single linear layer producing one logit per row.
#[derive(Module, Debug)]
pub struct LogisticModel<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> LogisticModel<B> {
    /// Creates a zero-initialized model for `input_size` encoded features.
    ///
    /// Zero initialization keeps training reproducible without seeding the backend.
    pub fn new(device: &B::Device, input_size: usize) -> Self {
        let linear = LinearConfig::new(input_size, 1)
            .with_initializer(Initializer::Zeros)
            .init(device);

        Self { linear }
    }

    /// Forward pass through the network.
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape [`batch_size`, `input_size`]
    ///
    /// # Returns
    ///
    /// Tensor of shape [`batch_size`, 1] containing logits.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(input)
    }

    /// Churn probabilities of shape [`batch_size`, 1].
    pub fn probabilities(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(self.forward(input))
    }

    /// Sum of squared weights; the bias is not penalized.
    pub fn weight_penalty(&self) -> Tensor<B, 1> {
        self.linear.weight.val().powf_scalar(2.0).sum()
    }
}

/// A fitted pipeline together with its held-out evaluation.
#[derive(Debug)]
pub struct Evaluation<B: Backend> {
    pub pipeline: ChurnPipeline<B>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub roc_auc: f64,
    pub pr_auc: f64,
    /// Operating threshold maximizing F1 on the test split.
    pub threshold: f64,
}

/// Splits the mart, fits the pipeline on the training split, and evaluates
/// it on the held-out split.
///
/// # Errors
///
/// Returns an error if the data cannot be split, training fails, or the
/// held-out scores are degenerate.
pub fn train_and_evaluate<B: AutodiffBackend>(
    records: &[FeatureRecord],
    schema: &FeatureSchema,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<Evaluation<B::InnerBackend>, ChurnError> {
    let labels: Vec<u8> = records.iter().map(|r| u8::from(r.churned())).collect();
    let split = stratified_split(&labels, config.test_size, config.seed)?;

    let train_records: Vec<&FeatureRecord> = split.train.iter().map(|&i| &records[i]).collect();
    let train_labels: Vec<u8> = split.train.iter().map(|&i| labels[i]).collect();
    let test_records: Vec<&FeatureRecord> = split.test.iter().map(|&i| &records[i]).collect();
    let test_labels: Vec<u8> = split.test.iter().map(|&i| labels[i]).collect();

    info!(
        train_rows = train_records.len(),
        test_rows = test_records.len(),
        "Split feature mart"
    );

    let pipeline = fit::<B>(&train_records, &train_labels, schema, config, device)?;
    let test_proba = pipeline.predict_proba(test_records.iter().copied())?;

    let roc_auc = metrics::roc_auc(&test_labels, &test_proba)?;
    let pr_auc = metrics::average_precision(&test_labels, &test_proba)?;
    let threshold = choose_threshold_max_f1(&test_labels, &test_proba)?;

    Ok(Evaluation {
        pipeline,
        train_rows: train_records.len(),
        test_rows: test_records.len(),
        roc_auc,
        pr_auc,
        threshold,
    })
}
