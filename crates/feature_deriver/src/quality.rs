//! Data-quality gate over a derived feature mart.

use std::collections::{BTreeMap, HashSet};

use churn_structs::FeatureRecord;
use serde::Serialize;
use tracing::{info, warn};

/// Summary statistics reported after derivation and before training.
///
/// None of these fail a run; a non-zero `total_charges` null rate is an
/// expected signal of the source data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub total_rows: usize,
    pub distinct_customers: usize,
    /// Row count per `churn_label` value.
    pub label_distribution: BTreeMap<i32, usize>,
    pub null_customer_id: usize,
    /// Rows with no usable tenure (negative). Derivation rejects these, so a
    /// mart written by ingest reports 0.
    pub null_tenure: usize,
    /// Rows with no usable monthly charge (non-finite).
    pub null_monthly_charges: usize,
    pub null_total_charges: usize,
    /// Share of rows whose `total_charges` is null, in `[0, 1]`.
    pub total_charges_null_rate: f64,
    /// Share of rows labelled as churned, in `[0, 1]`.
    pub churn_rate: f64,
}

impl QualityReport {
    /// Computes the report over a feature mart.
    #[must_use]
    pub fn from_records(records: &[FeatureRecord]) -> Self {
        let total_rows = records.len();

        let distinct_customers = records
            .iter()
            .map(|r| r.customer_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let mut label_distribution = BTreeMap::new();
        for record in records {
            *label_distribution.entry(record.churn_label).or_insert(0) += 1;
        }

        let null_customer_id = records.iter().filter(|r| r.customer_id.trim().is_empty()).count();
        let null_tenure = records.iter().filter(|r| r.tenure_months < 0).count();
        let null_monthly_charges = records.iter().filter(|r| !r.monthly_charges.is_finite()).count();
        let null_total_charges = records.iter().filter(|r| r.total_charges.is_none()).count();
        let churned = records.iter().filter(|r| r.churned()).count();

        Self {
            total_rows,
            distinct_customers,
            label_distribution,
            null_customer_id,
            null_tenure,
            null_monthly_charges,
            null_total_charges,
            total_charges_null_rate: ratio(null_total_charges, total_rows),
            churn_rate: ratio(churned, total_rows),
        }
    }

    /// Returns true when some customer id appears more than once.
    #[must_use]
    pub const fn has_duplicate_customers(&self) -> bool {
        self.distinct_customers < self.total_rows
    }

    /// Logs the report, warning on the signals worth a look.
    pub fn log(&self) {
        info!(
            rows = self.total_rows,
            distinct_customers = self.distinct_customers,
            labels = ?self.label_distribution,
            churn_rate = %format!("{:.2}%", self.churn_rate * 100.0),
            "Feature mart quality"
        );

        if self.null_customer_id + self.null_tenure + self.null_monthly_charges > 0 {
            warn!(
                customer_id = self.null_customer_id,
                tenure = self.null_tenure,
                monthly_charges = self.null_monthly_charges,
                "Required feature columns have missing values"
            );
        }

        if self.total_charges_null_rate > 0.0 {
            warn!(
                null_rows = self.null_total_charges,
                rate = %format!("{:.2}%", self.total_charges_null_rate * 100.0),
                "TotalCharges parse failure rate"
            );
        }

        if self.has_duplicate_customers() {
            warn!(
                duplicates = self.total_rows - self.distinct_customers,
                "Duplicate customer ids in feature mart"
            );
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use churn_structs::RawCustomerRecord;
    use churn_structs::raw_columns as raw;

    use super::*;
    use crate::derive_features;

    fn row(id: &str, total: &str, churn: &str) -> RawCustomerRecord {
        RawCustomerRecord::new()
            .with(raw::CUSTOMER_ID, id)
            .with(raw::TENURE, "10")
            .with(raw::MONTHLY_CHARGES, "50")
            .with(raw::TOTAL_CHARGES, total)
            .with(raw::CHURN, churn)
    }

    #[test]
    fn test_report_counts() {
        let records = derive_features(&[
            row("A1", "", "Yes"),
            row("A2", "100", "No"),
            row("A3", " ", "No"),
            row("A3", "300", "No"),
        ])
        .expect("derivation should succeed");

        let report = QualityReport::from_records(&records);

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.distinct_customers, 3);
        assert!(report.has_duplicate_customers());
        assert_eq!(report.label_distribution.get(&1), Some(&1));
        assert_eq!(report.label_distribution.get(&0), Some(&3));
        assert_eq!(report.null_total_charges, 2);
        assert_eq!(report.null_tenure, 0);
        assert_eq!(report.null_monthly_charges, 0);
        assert!((report.total_charges_null_rate - 0.5).abs() < f64::EPSILON);
        assert!((report.churn_rate - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_counts_unusable_required_values() {
        let mut records = derive_features(&[row("A1", "10", "No"), row("A2", "20", "Yes")])
            .expect("derivation should succeed");
        records[0].tenure_months = -1;
        records[1].monthly_charges = f64::NAN;
        records[1].customer_id = " ".to_string();

        let report = QualityReport::from_records(&records);

        assert_eq!(report.null_tenure, 1);
        assert_eq!(report.null_monthly_charges, 1);
        assert_eq!(report.null_customer_id, 1);
    }

    #[test]
    fn test_empty_report() {
        let report = QualityReport::from_records(&[]);
        assert_eq!(report.total_rows, 0);
        assert!(report.total_charges_null_rate.abs() < f64::EPSILON);
        assert!(!report.has_duplicate_customers());
    }
}
