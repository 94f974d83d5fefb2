use burn::prelude::*;
use churn_structs::{ChurnError, FeatureRecord};

use crate::LogisticModel;
use crate::dataset::ChurnBatcher;
use crate::preprocess::FittedPreprocessor;
use crate::training::TrainingReport;

/// Fitted preprocessing plus classifier, ready for inference.
#[derive(Debug)]
pub struct ChurnPipeline<B: Backend> {
    preprocessor: FittedPreprocessor,
    model: LogisticModel<B>,
    device: B::Device,
    report: TrainingReport,
}

impl<B: Backend> ChurnPipeline<B> {
    pub(crate) const fn new(
        preprocessor: FittedPreprocessor,
        model: LogisticModel<B>,
        device: B::Device,
        report: TrainingReport,
    ) -> Self {
        Self {
            preprocessor,
            model,
            device,
            report,
        }
    }

    /// Churn probability for each record, in input order.
    ///
    /// Works for any record, including customers outside the training split.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be encoded or the output tensor
    /// cannot be read.
    pub fn predict_proba<'a>(
        &self,
        records: impl IntoIterator<Item = &'a FeatureRecord>,
    ) -> Result<Vec<f64>, ChurnError> {
        let rows = records
            .into_iter()
            .map(|record| self.preprocessor.transform(record))
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let batcher = ChurnBatcher::<B>::new(self.device.clone());
        let inputs = batcher.inputs(&rows, self.preprocessor.width());

        let proba = self
            .model
            .probabilities(inputs)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| ChurnError::Model(format!("cannot read probabilities: {e:?}")))?;

        Ok(proba.into_iter().map(|p| f64::from(p).clamp(0.0, 1.0)).collect())
    }

    #[must_use]
    pub const fn report(&self) -> &TrainingReport {
        &self.report
    }

    #[must_use]
    pub const fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }
}
