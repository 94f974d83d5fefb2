use thiserror::Error;

/// Errors that abort a pipeline run.
///
/// Every variant is fatal to the run. A blank `total_charges` is not an error
/// and never surfaces here.
#[derive(Error, Debug)]
pub enum ChurnError {
    /// A required raw field failed to parse.
    #[error("Corrupt input in column `{column}` for customer `{customer_id}`: {value:?}")]
    CorruptInput {
        column: String,
        customer_id: String,
        value: Option<String>,
    },

    /// Expected columns are absent from a table.
    #[error("Schema mismatch in `{table}`: missing columns {missing:?}")]
    SchemaMismatch { table: String, missing: Vec<String> },

    /// Held-out predictions cannot produce a threshold or metric.
    #[error("Degenerate score distribution: {0}")]
    DegenerateScoreDistribution(String),

    /// Not enough rows or classes to split and train.
    #[error("Insufficient training data: {0}")]
    InsufficientData(String),

    /// Tensor or model failure inside the classifier.
    #[error("Model error: {0}")]
    Model(String),

    /// Any failure talking to the persistent store.
    #[error("Store I/O error: {0}")]
    StoreIo(#[from] sqlx::Error),
}

impl ChurnError {
    /// Builds a [`ChurnError::CorruptInput`] for one offending field.
    #[must_use]
    pub fn corrupt(column: &str, customer_id: &str, value: Option<&str>) -> Self {
        Self::CorruptInput {
            column: column.to_string(),
            customer_id: customer_id.to_string(),
            value: value.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_input_message() {
        let err = ChurnError::corrupt("tenure", "A1", Some("abc"));
        assert_eq!(
            err.to_string(),
            "Corrupt input in column `tenure` for customer `A1`: Some(\"abc\")"
        );
    }

    #[test]
    fn test_schema_mismatch_message() {
        let err = ChurnError::SchemaMismatch {
            table: "customer_churn_features".to_string(),
            missing: vec!["churn_label".to_string()],
        };
        assert!(err.to_string().contains("churn_label"));
    }
}
