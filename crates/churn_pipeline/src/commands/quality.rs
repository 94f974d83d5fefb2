//! Quality command - reports on the stored feature mart.

use anyhow::Result;
use churn_structs::FEATURE_SCHEMA_V1;
use database::{FeatureStore, load_feature_table};
use feature_deriver::QualityReport;

/// Runs the quality command.
///
/// # Errors
///
/// Returns an error if the feature table is missing columns or cannot be read.
pub async fn run<S: FeatureStore + ?Sized>(store: &S) -> Result<QualityReport> {
    let records = load_feature_table(store, &FEATURE_SCHEMA_V1).await?;

    let report = QualityReport::from_records(&records);
    report.log();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use database::MemoryFeatureStore;

    use super::*;
    use crate::commands::ingest;
    use crate::commands::ingest::tests::write_export;

    #[tokio::test]
    async fn test_quality_matches_ingest() {
        let file = write_export(20);
        let store = MemoryFeatureStore::new();

        let ingested = ingest::run(&store, file.path()).await.unwrap();
        let stored = run(&store).await.unwrap();

        assert_eq!(stored, ingested);
    }

    #[tokio::test]
    async fn test_quality_on_empty_table() {
        let report = run(&MemoryFeatureStore::new()).await.unwrap();
        assert_eq!(report.total_rows, 0);
    }
}
