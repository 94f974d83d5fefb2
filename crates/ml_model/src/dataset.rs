//! Dataset and batching for Burn training.

use burn::prelude::*;
use churn_structs::{ChurnError, FeatureRecord};

use crate::preprocess::FittedPreprocessor;

/// A single encoded row.
#[derive(Debug, Clone)]
pub struct ChurnDatasetItem {
    /// Encoded feature vector.
    pub features: Vec<f32>,
    /// 1 when the customer churned.
    pub label: u8,
}

/// Encoded training rows.
#[derive(Debug, Clone)]
pub struct ChurnDataset {
    items: Vec<ChurnDatasetItem>,
}

impl ChurnDataset {
    /// Encodes `records` with a fitted preprocessor.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be encoded.
    pub fn encode(
        preprocessor: &FittedPreprocessor,
        records: &[&FeatureRecord],
        labels: &[u8],
    ) -> Result<Self, ChurnError> {
        let items = records
            .iter()
            .zip(labels)
            .map(|(record, &label)| {
                Ok(ChurnDatasetItem {
                    features: preprocessor.transform(record)?,
                    label,
                })
            })
            .collect::<Result<Vec<_>, ChurnError>>()?;

        Ok(Self { items })
    }

    /// All items, in input order.
    #[must_use]
    pub fn items(&self) -> &[ChurnDatasetItem] {
        &self.items
    }
}

impl burn::data::dataset::Dataset<ChurnDatasetItem> for ChurnDataset {
    fn get(&self, index: usize) -> Option<ChurnDatasetItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A batch of training data.
#[derive(Debug, Clone)]
pub struct ChurnBatch<B: Backend> {
    /// Input features tensor of shape `[batch_size, width]`.
    pub inputs: Tensor<B, 2>,
    /// Labels as floats, shape `[batch_size, 1]`.
    pub targets: Tensor<B, 2>,
    /// Balanced per-row class weights, shape `[batch_size, 1]`.
    pub weights: Tensor<B, 2>,
}

/// Batcher for creating training batches.
#[derive(Debug, Clone)]
pub struct ChurnBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> ChurnBatcher<B> {
    /// Creates a new batcher for the given device.
    #[must_use]
    pub const fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Creates a batch from items of equal width.
    ///
    /// Each row is weighted `n / (2 * n_class)` so both classes carry equal
    /// total weight.
    pub fn batch(&self, items: &[ChurnDatasetItem]) -> ChurnBatch<B> {
        let batch_size = items.len();
        let width = items.first().map_or(0, |item| item.features.len());

        let positives = items.iter().filter(|item| item.label == 1).count();
        let negatives = batch_size - positives;

        let mut features_data = Vec::with_capacity(batch_size * width);
        let mut targets_data = Vec::with_capacity(batch_size);
        let mut weights_data = Vec::with_capacity(batch_size);

        for item in items {
            features_data.extend_from_slice(&item.features);

            let class_count = if item.label == 1 { positives } else { negatives };
            targets_data.push(f32::from(item.label));
            weights_data.push(balanced_weight(batch_size, class_count));
        }

        let inputs = Tensor::<B, 1>::from_floats(features_data.as_slice(), &self.device)
            .reshape([batch_size, width]);

        let targets = Tensor::<B, 1>::from_floats(targets_data.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        let weights = Tensor::<B, 1>::from_floats(weights_data.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        ChurnBatch {
            inputs,
            targets,
            weights,
        }
    }

    /// Builds an input-only tensor for inference.
    pub fn inputs(&self, rows: &[Vec<f32>], width: usize) -> Tensor<B, 2> {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();

        Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device).reshape([rows.len(), width])
    }
}

#[expect(clippy::cast_possible_truncation, reason = "weights are f32")]
fn balanced_weight(total: usize, class_count: usize) -> f32 {
    if class_count == 0 {
        return 0.0;
    }
    (total as f64 / (2.0 * class_count as f64)) as f32
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use burn::data::dataset::Dataset;
    use churn_structs::FEATURE_SCHEMA_V1;

    use super::*;
    use crate::test_support::synthetic_records;

    type TestBackend = NdArray;

    fn item(label: u8) -> ChurnDatasetItem {
        ChurnDatasetItem {
            features: vec![f32::from(label); 3],
            label,
        }
    }

    #[test]
    fn test_dataset_encoding() {
        let records = synthetic_records(10);
        let refs: Vec<&FeatureRecord> = records.iter().collect();
        let labels: Vec<u8> = records.iter().map(|r| u8::from(r.churned())).collect();

        let preprocessor = FittedPreprocessor::fit(&FEATURE_SCHEMA_V1, &refs).unwrap();
        let dataset = ChurnDataset::encode(&preprocessor, &refs, &labels).unwrap();

        assert_eq!(dataset.len(), 10);
        assert!(!dataset.is_empty());
        assert_eq!(
            dataset.get(0).map(|item| item.features.len()),
            Some(preprocessor.width())
        );
        assert!(dataset.get(10).is_none());
    }

    #[test]
    fn test_batcher() {
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let batcher = ChurnBatcher::<TestBackend>::new(device);

        let items = vec![item(1), item(0), item(0), item(0)];
        let batch = batcher.batch(&items);

        assert_eq!(batch.inputs.dims(), [4, 3]);
        assert_eq!(batch.targets.dims(), [4, 1]);

        let weights: Vec<f32> = batch.weights.into_data().to_vec().unwrap();
        assert!((weights[0] - 2.0).abs() < 1e-6);
        assert!((weights[1] - 4.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_balanced_weights_sum_equally() {
        let positive = balanced_weight(10, 2) * 2.0;
        let negative = balanced_weight(10, 8) * 8.0;
        assert!((positive - negative).abs() < 1e-5);
        assert!(balanced_weight(10, 0).abs() < f32::EPSILON);
    }
}
