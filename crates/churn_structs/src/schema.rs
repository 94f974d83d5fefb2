//! Versioned descriptor of the feature mart layout.

use crate::ChurnError;

/// How a feature-table column is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Identifier,
    Numeric,
    Categorical,
    Label,
}

/// Ordered `(column, kind)` pairs describing a feature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    pub version: &'static str,
    pub table: &'static str,
    pub columns: &'static [(&'static str, ColumnKind)],
}

/// The `customer_churn_features` layout produced by the feature deriver.
pub const FEATURE_SCHEMA_V1: FeatureSchema = FeatureSchema {
    version: "v1",
    table: "customer_churn_features",
    columns: &[
        ("customer_id", ColumnKind::Identifier),
        ("gender", ColumnKind::Categorical),
        ("senior_citizen", ColumnKind::Numeric),
        ("has_partner", ColumnKind::Categorical),
        ("has_dependents", ColumnKind::Categorical),
        ("tenure_months", ColumnKind::Numeric),
        ("contract_type", ColumnKind::Categorical),
        ("internet_service", ColumnKind::Categorical),
        ("payment_method", ColumnKind::Categorical),
        ("paperless_billing", ColumnKind::Categorical),
        ("monthly_charges", ColumnKind::Numeric),
        ("total_charges", ColumnKind::Numeric),
        ("is_new_customer", ColumnKind::Numeric),
        ("is_month_to_month", ColumnKind::Numeric),
        ("is_high_monthly_charges", ColumnKind::Numeric),
        ("churn_label", ColumnKind::Label),
    ],
};

impl FeatureSchema {
    /// Column names of the given kind, in schema order.
    pub fn columns_of(&self, kind: ColumnKind) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .filter(move |(_, k)| *k == kind)
            .map(|(name, _)| *name)
    }

    /// All column names, in schema order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(name, _)| *name)
    }

    /// Checks fetched column names against the descriptor.
    ///
    /// Names are compared lower-cased; extra columns are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::SchemaMismatch`] listing every missing column.
    pub fn validate<S: AsRef<str>>(&self, fetched: &[S]) -> Result<(), ChurnError> {
        let fetched: Vec<String> = fetched
            .iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .collect();

        let missing: Vec<String> = self
            .column_names()
            .filter(|name| !fetched.iter().any(|c| c == name))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ChurnError::SchemaMismatch {
                table: self.table.to_string(),
                missing,
            })
        }
    }
}
