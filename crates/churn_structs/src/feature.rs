use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Canonical per-customer row of the feature mart.
///
/// Field names match the `customer_churn_features` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeatureRecord {
    pub customer_id: String,
    pub gender: Option<String>,
    pub senior_citizen: i32,
    pub has_partner: bool,
    pub has_dependents: bool,
    pub tenure_months: i32,
    pub contract_type: Option<String>,
    pub internet_service: Option<String>,
    pub payment_method: Option<String>,
    pub paperless_billing: bool,
    pub monthly_charges: f64,
    /// Null when the source value was blank or not a number.
    pub total_charges: Option<f64>,
    pub is_new_customer: i32,
    pub is_month_to_month: i32,
    pub is_high_monthly_charges: i32,
    pub churn_label: i32,
}

/// A single feature cell, typed by how the model consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue<'a> {
    Number(Option<f64>),
    Category(Option<Cow<'a, str>>),
}

impl FeatureRecord {
    /// Looks up a model input column by name.
    ///
    /// Returns `None` for the identifier, the label, and unknown names.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<FeatureValue<'_>> {
        let value = match column {
            "gender" => category(self.gender.as_deref()),
            "senior_citizen" => FeatureValue::Number(Some(f64::from(self.senior_citizen))),
            "has_partner" => flag(self.has_partner),
            "has_dependents" => flag(self.has_dependents),
            "tenure_months" => FeatureValue::Number(Some(f64::from(self.tenure_months))),
            "contract_type" => category(self.contract_type.as_deref()),
            "internet_service" => category(self.internet_service.as_deref()),
            "payment_method" => category(self.payment_method.as_deref()),
            "paperless_billing" => flag(self.paperless_billing),
            "monthly_charges" => FeatureValue::Number(Some(self.monthly_charges)),
            "total_charges" => FeatureValue::Number(self.total_charges),
            "is_new_customer" => FeatureValue::Number(Some(f64::from(self.is_new_customer))),
            "is_month_to_month" => FeatureValue::Number(Some(f64::from(self.is_month_to_month))),
            "is_high_monthly_charges" => {
                FeatureValue::Number(Some(f64::from(self.is_high_monthly_charges)))
            }
            _ => return None,
        };

        Some(value)
    }

    /// Returns true when the customer churned.
    #[must_use]
    pub const fn churned(&self) -> bool {
        self.churn_label == 1
    }
}

fn category(value: Option<&str>) -> FeatureValue<'_> {
    FeatureValue::Category(value.map(Cow::Borrowed))
}

const fn flag(value: bool) -> FeatureValue<'static> {
    FeatureValue::Category(Some(Cow::Borrowed(if value { "true" } else { "false" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureRecord {
        FeatureRecord {
            customer_id: "A1".to_string(),
            gender: Some("Female".to_string()),
            senior_citizen: 0,
            has_partner: true,
            has_dependents: false,
            tenure_months: 5,
            contract_type: Some("Month-to-month".to_string()),
            internet_service: None,
            payment_method: Some("Electronic check".to_string()),
            paperless_billing: true,
            monthly_charges: 85.0,
            total_charges: None,
            is_new_customer: 1,
            is_month_to_month: 1,
            is_high_monthly_charges: 1,
            churn_label: 1,
        }
    }

    #[test]
    fn test_value_lookup() {
        let record = sample();
        assert_eq!(
            record.value("tenure_months"),
            Some(FeatureValue::Number(Some(5.0)))
        );
        assert_eq!(
            record.value("total_charges"),
            Some(FeatureValue::Number(None))
        );
        assert_eq!(
            record.value("has_partner"),
            Some(FeatureValue::Category(Some(Cow::Borrowed("true"))))
        );
        assert_eq!(
            record.value("internet_service"),
            Some(FeatureValue::Category(None))
        );
    }

    #[test]
    fn test_identifier_and_label_are_not_inputs() {
        let record = sample();
        assert!(record.value("customer_id").is_none());
        assert!(record.value("churn_label").is_none());
        assert!(record.churned());
    }
}
