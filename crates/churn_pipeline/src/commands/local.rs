//! Local command - runs ingest and training against an in-memory store.

use std::path::Path;

use anyhow::Result;
use burn::backend::ndarray::NdArrayDevice;
use database::{FeatureStore, MemoryFeatureStore};
use ml_model::TrainingConfig;

use super::{ingest, train};

/// Runs the whole pipeline on `path` without a database.
///
/// # Errors
///
/// Returns an error if any stage fails. The in-memory store is closed either way.
pub async fn run(
    path: &Path,
    model_name: &str,
    config: &TrainingConfig,
    device: &NdArrayDevice,
) -> Result<train::RunOutcome> {
    let store = MemoryFeatureStore::new();

    let result = async {
        ingest::run(&store, path).await?;
        train::run(&store, model_name, config, device).await
    }
    .await;

    store.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ingest::tests::write_export;

    #[tokio::test]
    async fn test_local_run() {
        let file = write_export(80);
        let config = TrainingConfig {
            max_iter: 200,
            ..TrainingConfig::default()
        };

        let outcome = run(file.path(), train::DEFAULT_MODEL_NAME, &config, &NdArrayDevice::default())
            .await
            .unwrap();

        assert_eq!(outcome.scored_rows, 80);
        assert_eq!(outcome.test_rows, 16);
        assert!(serde_json::to_string(&outcome).unwrap().contains("run_id"));
    }

    #[tokio::test]
    async fn test_local_run_missing_file() {
        let result = run(
            Path::new("/definitely/not/here.tsv"),
            train::DEFAULT_MODEL_NAME,
            &TrainingConfig::default(),
            &NdArrayDevice::default(),
        )
        .await;

        assert!(result.is_err());
    }
}
