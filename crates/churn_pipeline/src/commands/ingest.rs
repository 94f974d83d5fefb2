//! Ingest command - derives the feature mart from a raw export.

use std::path::Path;

use anyhow::Result;
use churn_structs::FeatureRecord;
use database::FeatureStore;
use feature_deriver::{QualityReport, check_raw_columns, derive_features};
use source_reader::read_raw_records;
use tracing::info;

/// Reads a raw export and derives its feature records.
///
/// Logs the quality report; a non-zero `total_charges` null rate is a
/// warning only.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a required column is missing,
/// or a required field is corrupt.
pub fn load_features(path: &Path) -> Result<(Vec<FeatureRecord>, QualityReport)> {
    let source = read_raw_records(path)?;
    check_raw_columns(&source.columns)?;

    let records = derive_features(&source.records)?;

    info!(
        path = %path.display(),
        delimiter = %char::from(source.delimiter).escape_default(),
        raw_rows = source.records.len(),
        dropped = source.records.len() - records.len(),
        "Derived feature records"
    );

    let report = QualityReport::from_records(&records);
    report.log();

    Ok((records, report))
}

/// Runs the ingest command.
///
/// Nothing is written unless the whole file derives cleanly.
///
/// # Errors
///
/// Returns an error if derivation or the store write fails.
pub async fn run<S: FeatureStore + ?Sized>(store: &S, path: &Path) -> Result<QualityReport> {
    info!(path = %path.display(), "Ingesting source file");

    let (records, report) = load_features(path)?;
    let written = store.replace_features(&records).await?;

    info!(rows = written, "Feature table replaced");

    Ok(report)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use churn_structs::ChurnError;
    use database::MemoryFeatureStore;

    use super::*;

    const HEADER: &str = "customerID\tgender\tSeniorCitizen\tPartner\tDependents\ttenure\tContract\t\
                          InternetService\tPaymentMethod\tPaperlessBilling\tMonthlyCharges\tTotalCharges\tChurn";

    /// Writes a tab-separated export with `rows` customers.
    pub(crate) fn write_export(rows: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "{HEADER}").expect("write header");

        for i in 0..rows {
            let tenure = (i * 7) % 72;
            let monthly = 20.0 + ((i * 13) % 100) as f64;
            let contract = if i % 3 == 0 { "Two year" } else { "Month-to-month" };
            let churn = if (tenure < 18 && i % 3 != 0) || i % 23 == 0 { "Yes" } else { "No" };
            let total = if i % 9 == 0 { " ".to_string() } else { format!("{:.2}", monthly * tenure as f64) };
            let gender = if i % 2 == 0 { "Female" } else { "Male" };
            let yes_no = |flag: bool| if flag { "Yes" } else { "No" };

            writeln!(
                file,
                "C{i:04}\t{gender}\t{}\t{}\t{}\t{tenure}\t{contract}\t{}\tElectronic check\t{}\t{monthly:.2}\t{total}\t{churn}",
                i32::from(i % 5 == 0),
                yes_no(i % 4 == 0),
                yes_no(i % 6 == 0),
                ["DSL", "Fiber optic", "No"][i % 3],
                yes_no(i % 2 == 1),
            )
            .expect("write row");
        }

        file
    }

    #[test]
    fn test_load_features_reports_null_total_charges() {
        let file = write_export(30);

        let (records, report) = load_features(file.path()).unwrap();

        assert_eq!(records.len(), 30);
        assert_eq!(report.null_total_charges, 4);
        assert_eq!(report.distinct_customers, 30);
    }

    #[test]
    fn test_load_features_rejects_missing_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "customerID\ttenure\nA1\t5").unwrap();

        assert!(load_features(file.path()).is_err());
    }

    #[tokio::test]
    async fn test_run_replaces_feature_table() {
        let file = write_export(12);
        let store = MemoryFeatureStore::new();

        run(&store, file.path()).await.unwrap();
        run(&store, file.path()).await.unwrap();

        assert_eq!(store.fetch_features().await.unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_corrupt_row_leaves_feature_table_untouched() {
        let store = MemoryFeatureStore::new();
        run(&store, write_export(12).path()).await.unwrap();
        let before = store.fetch_features().await.unwrap();

        let mut corrupt = write_export(20);
        writeln!(
            corrupt,
            "C9999\tFemale\t0\tNo\tNo\tabc\tOne year\tDSL\tMailed check\tNo\t50.00\t100.00\tNo"
        )
        .unwrap();

        let err = run(&store, corrupt.path()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ChurnError>(),
            Some(ChurnError::CorruptInput { .. })
        ));
        assert_eq!(store.fetch_features().await.unwrap(), before);
    }
}
