use std::collections::HashMap;

/// Raw Telco-churn column names, as they appear in the source file header.
pub mod raw_columns {
    pub const CUSTOMER_ID: &str = "customerID";
    pub const GENDER: &str = "gender";
    pub const SENIOR_CITIZEN: &str = "SeniorCitizen";
    pub const PARTNER: &str = "Partner";
    pub const DEPENDENTS: &str = "Dependents";
    pub const TENURE: &str = "tenure";
    pub const CONTRACT: &str = "Contract";
    pub const INTERNET_SERVICE: &str = "InternetService";
    pub const PAYMENT_METHOD: &str = "PaymentMethod";
    pub const PAPERLESS_BILLING: &str = "PaperlessBilling";
    pub const MONTHLY_CHARGES: &str = "MonthlyCharges";
    pub const TOTAL_CHARGES: &str = "TotalCharges";
    pub const CHURN: &str = "Churn";

    /// Every column the feature derivation reads.
    pub const REQUIRED: [&str; 13] = [
        CUSTOMER_ID,
        GENDER,
        SENIOR_CITIZEN,
        PARTNER,
        DEPENDENTS,
        TENURE,
        CONTRACT,
        INTERNET_SERVICE,
        PAYMENT_METHOD,
        PAPERLESS_BILLING,
        MONTHLY_CHARGES,
        TOTAL_CHARGES,
        CHURN,
    ];
}

/// One untyped row of the source file.
///
/// Values are kept as read; `None` is a null cell. Nothing is validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCustomerRecord {
    fields: HashMap<String, Option<String>>,
}

impl RawCustomerRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly used by tests and fixtures.
    #[must_use]
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.insert(column, Some(value.to_string()));
        self
    }

    /// Sets a column value, replacing any previous one.
    pub fn insert(&mut self, column: &str, value: Option<String>) {
        self.fields.insert(column.to_string(), value);
    }

    /// Returns the value of a column, or `None` when the cell is null or the
    /// column is absent.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).and_then(Option::as_deref)
    }

    /// Number of columns carried by this record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Option<String>)> for RawCustomerRecord {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
