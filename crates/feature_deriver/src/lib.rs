//! Feature deriver crate for the churn model.
//!
//! This crate transforms raw Telco-churn rows into canonical
//! `FeatureRecord`s, the rows of the feature mart the model trains on.

use churn_structs::raw_columns as raw;
use churn_structs::{ChurnError, FeatureRecord, RawCustomerRecord};

mod quality;

pub use quality::QualityReport;

/// Tenure, in months, below which a customer counts as new.
pub const NEW_CUSTOMER_TENURE_MONTHS: i32 = 6;

/// Monthly charge at or above which a customer counts as high-paying.
pub const HIGH_MONTHLY_CHARGES: f64 = 80.0;

/// Contract value flagged by `is_month_to_month`, matched case-insensitively.
pub const MONTH_TO_MONTH: &str = "month-to-month";

/// Checks that a source header carries every column the derivation reads.
///
/// # Errors
///
/// Returns [`ChurnError::SchemaMismatch`] listing the absent columns.
pub fn check_raw_columns<S: AsRef<str>>(columns: &[S]) -> Result<(), ChurnError> {
    let missing: Vec<String> = raw::REQUIRED
        .iter()
        .filter(|required| !columns.iter().any(|c| c.as_ref().trim() == **required))
        .map(|c| (*c).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ChurnError::SchemaMismatch {
            table: "source file".to_string(),
            missing,
        })
    }
}

/// Derives feature records from raw rows.
///
/// Rows with a null or blank customer id are dropped. Every other row yields
/// exactly one record, in input order.
///
/// # Errors
///
/// Returns [`ChurnError::CorruptInput`] for the first row whose tenure,
/// senior-citizen flag or monthly charge does not parse. The whole batch fails.
/// A null senior-citizen flag is not a parse failure and reads as 0.
pub fn derive_features(records: &[RawCustomerRecord]) -> Result<Vec<FeatureRecord>, ChurnError> {
    let mut features = Vec::with_capacity(records.len());

    for record in records {
        if let Some(feature) = derive_record(record)? {
            features.push(feature);
        }
    }

    let dropped = records.len() - features.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Dropped rows without a customer id");
    }

    Ok(features)
}

/// Derives one record; `Ok(None)` when the row has no customer id.
///
/// # Errors
///
/// Returns [`ChurnError::CorruptInput`] when a required numeric field is bad.
pub fn derive_record(record: &RawCustomerRecord) -> Result<Option<FeatureRecord>, ChurnError> {
    let Some(customer_id) = record
        .get(raw::CUSTOMER_ID)
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return Ok(None);
    };

    let tenure_months = parse_int(record, raw::TENURE, customer_id)?;
    if tenure_months < 0 {
        return Err(ChurnError::corrupt(raw::TENURE, customer_id, record.get(raw::TENURE)));
    }

    // A null senior flag reads as 0, like the other yes/no fields.
    let senior_citizen = match record.get(raw::SENIOR_CITIZEN) {
        None => 0,
        Some(_) => parse_int(record, raw::SENIOR_CITIZEN, customer_id)?,
    };
    if !matches!(senior_citizen, 0 | 1) {
        return Err(ChurnError::corrupt(
            raw::SENIOR_CITIZEN,
            customer_id,
            record.get(raw::SENIOR_CITIZEN),
        ));
    }

    let monthly_charges = record
        .get(raw::MONTHLY_CHARGES)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ChurnError::corrupt(raw::MONTHLY_CHARGES, customer_id, record.get(raw::MONTHLY_CHARGES))
        })?;

    let contract_type = text(record, raw::CONTRACT);
    let is_month_to_month = contract_type
        .as_deref()
        .is_some_and(|c| c.to_lowercase().contains(MONTH_TO_MONTH));

    Ok(Some(FeatureRecord {
        customer_id: customer_id.to_string(),
        gender: text(record, raw::GENDER),
        senior_citizen,
        has_partner: is_yes(record, raw::PARTNER),
        has_dependents: is_yes(record, raw::DEPENDENTS),
        tenure_months,
        contract_type,
        internet_service: text(record, raw::INTERNET_SERVICE),
        payment_method: text(record, raw::PAYMENT_METHOD),
        paperless_billing: is_yes(record, raw::PAPERLESS_BILLING),
        monthly_charges,
        total_charges: parse_total_charges(record.get(raw::TOTAL_CHARGES)),
        is_new_customer: i32::from(tenure_months < NEW_CUSTOMER_TENURE_MONTHS),
        is_month_to_month: i32::from(is_month_to_month),
        is_high_monthly_charges: i32::from(monthly_charges >= HIGH_MONTHLY_CHARGES),
        churn_label: i32::from(is_yes(record, raw::CHURN)),
    }))
}

/// Parses `TotalCharges`; blank or malformed values are null, never errors.
#[must_use]
pub fn parse_total_charges(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_int(record: &RawCustomerRecord, column: &str, customer_id: &str) -> Result<i32, ChurnError> {
    let value = record.get(column);
    value
        .and_then(|v| v.trim().parse::<i32>().ok())
        .ok_or_else(|| ChurnError::corrupt(column, customer_id, value))
}

// Exact, case-sensitive match.
fn is_yes(record: &RawCustomerRecord, column: &str) -> bool {
    record.get(column) == Some("Yes")
}

fn text(record: &RawCustomerRecord, column: &str) -> Option<String> {
    record.get(column).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row(id: &str, tenure: &str, monthly: &str) -> RawCustomerRecord {
        RawCustomerRecord::new()
            .with(raw::CUSTOMER_ID, id)
            .with(raw::GENDER, "Female")
            .with(raw::SENIOR_CITIZEN, "0")
            .with(raw::PARTNER, "Yes")
            .with(raw::DEPENDENTS, "No")
            .with(raw::TENURE, tenure)
            .with(raw::CONTRACT, "Two year")
            .with(raw::INTERNET_SERVICE, "DSL")
            .with(raw::PAYMENT_METHOD, "Mailed check")
            .with(raw::PAPERLESS_BILLING, "No")
            .with(raw::MONTHLY_CHARGES, monthly)
            .with(raw::TOTAL_CHARGES, "100.0")
            .with(raw::CHURN, "No")
    }

    #[test]
    fn test_end_to_end_scenario() {
        let record = RawCustomerRecord::new()
            .with(raw::CUSTOMER_ID, "A1")
            .with(raw::TENURE, "5")
            .with(raw::MONTHLY_CHARGES, "85.0")
            .with(raw::TOTAL_CHARGES, "")
            .with(raw::CONTRACT, "Month-to-month")
            .with(raw::CHURN, "Yes");

        let features = derive_features(&[record]).expect("derivation should succeed");
        assert_eq!(features.len(), 1);

        let f = &features[0];
        assert_eq!(f.customer_id, "A1");
        assert_eq!(f.tenure_months, 5);
        assert!((f.monthly_charges - 85.0).abs() < f64::EPSILON);
        assert_eq!(f.total_charges, None);
        assert_eq!(f.is_new_customer, 1);
        assert_eq!(f.is_month_to_month, 1);
        assert_eq!(f.is_high_monthly_charges, 1);
        assert_eq!(f.churn_label, 1);
        assert!(!f.has_partner);
        assert_eq!(f.senior_citizen, 0);
        assert_eq!(f.gender, None);
    }

    #[test]
    fn test_one_record_per_identified_row() {
        let rows = vec![raw_row("A1", "1", "10"), raw_row("A2", "2", "20"), raw_row("A3", "3", "30")];
        let features = derive_features(&rows).expect("derivation should succeed");

        let ids: Vec<_> = features.iter().map(|f| f.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2", "A3"]);
    }

    #[test]
    fn test_rows_without_id_are_dropped() {
        let mut null_id = raw_row("ignored", "1", "10");
        null_id.insert(raw::CUSTOMER_ID, None);

        let rows = vec![
            raw_row("A1", "1", "10"),
            null_id,
            raw_row("   ", "1", "10"),
            raw_row("A4", "4", "40"),
        ];
        let features = derive_features(&rows).expect("derivation should succeed");

        assert_eq!(features.len(), rows.len() - 2);
    }

    #[test]
    fn test_new_customer_boundary() {
        let five = derive_record(&raw_row("A", "5", "10")).unwrap().unwrap();
        let six = derive_record(&raw_row("B", "6", "10")).unwrap().unwrap();
        assert_eq!(five.is_new_customer, 1);
        assert_eq!(six.is_new_customer, 0);
    }

    #[test]
    fn test_high_monthly_charges_boundary() {
        let at = derive_record(&raw_row("A", "10", "80.0")).unwrap().unwrap();
        let below = derive_record(&raw_row("B", "10", "79.99")).unwrap().unwrap();
        assert_eq!(at.is_high_monthly_charges, 1);
        assert_eq!(below.is_high_monthly_charges, 0);
    }

    #[test]
    fn test_month_to_month_is_case_insensitive_substring() {
        let record = raw_row("A", "10", "10").with(raw::CONTRACT, "MONTH-TO-MONTH (legacy)");
        let f = derive_record(&record).unwrap().unwrap();
        assert_eq!(f.is_month_to_month, 1);

        let record = raw_row("B", "10", "10").with(raw::CONTRACT, "One year");
        let f = derive_record(&record).unwrap().unwrap();
        assert_eq!(f.is_month_to_month, 0);
    }

    #[test]
    fn test_churn_label_is_case_sensitive() {
        let yes = derive_record(&raw_row("A", "1", "1").with(raw::CHURN, "Yes")).unwrap().unwrap();
        let lower = derive_record(&raw_row("B", "1", "1").with(raw::CHURN, "yes")).unwrap().unwrap();
        assert_eq!(yes.churn_label, 1);
        assert_eq!(lower.churn_label, 0);
    }

    #[test]
    fn test_blank_total_charges_never_fails() {
        for blank in ["", " ", "   ", "n/a"] {
            let record = raw_row("A", "1", "1").with(raw::TOTAL_CHARGES, blank);
            let f = derive_record(&record).expect("blank total charges must not fail").unwrap();
            assert_eq!(f.total_charges, None, "value {blank:?}");
        }

        let mut null_total = raw_row("B", "1", "1");
        null_total.insert(raw::TOTAL_CHARGES, None);
        assert_eq!(derive_record(&null_total).unwrap().unwrap().total_charges, None);

        assert_eq!(parse_total_charges(Some(" 42.5 ")), Some(42.5));
    }

    #[test]
    fn test_bad_tenure_fails_batch() {
        let rows = vec![raw_row("A1", "1", "10"), raw_row("A2", "abc", "10")];
        let err = derive_features(&rows).expect_err("bad tenure should fail");

        match err {
            ChurnError::CorruptInput { column, customer_id, .. } => {
                assert_eq!(column, raw::TENURE);
                assert_eq!(customer_id, "A2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_monthly_charges_and_senior_flag_fail() {
        assert!(matches!(
            derive_record(&raw_row("A", "1", "")),
            Err(ChurnError::CorruptInput { .. })
        ));
        assert!(matches!(
            derive_record(&raw_row("A", "1", "10").with(raw::SENIOR_CITIZEN, "2")),
            Err(ChurnError::CorruptInput { .. })
        ));
        assert!(matches!(
            derive_record(&raw_row("A", "-1", "10")),
            Err(ChurnError::CorruptInput { .. })
        ));
    }

    #[test]
    fn test_check_raw_columns() {
        assert!(check_raw_columns(&raw::REQUIRED).is_ok());

        let partial = ["customerID", "tenure"];
        let Err(ChurnError::SchemaMismatch { missing, .. }) = check_raw_columns(&partial) else {
            panic!("expected schema mismatch");
        };
        assert_eq!(missing.len(), raw::REQUIRED.len() - 2);
    }
}
