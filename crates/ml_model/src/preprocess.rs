//! Column preprocessing fitted on the training split.
//!
//! Numeric columns are median-imputed then standardized. Categorical columns
//! are mode-imputed then one-hot encoded over the training vocabulary; a
//! category never seen in training encodes as all zeros.

use std::collections::{BTreeMap, BTreeSet};

use churn_structs::{ChurnError, ColumnKind, FeatureRecord, FeatureSchema, FeatureValue};
use serde::Serialize;

/// Fill value for a categorical column with no observed values.
const MISSING_CATEGORY: &str = "missing";

/// Standard deviations below this leave a column unscaled.
const MIN_SCALE: f64 = 1e-12;

/// Fitted encoding of one schema column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ColumnEncoder {
    Numeric {
        name: &'static str,
        median: f64,
        mean: f64,
        scale: f64,
    },
    Categorical {
        name: &'static str,
        mode: String,
        categories: Vec<String>,
    },
}

impl ColumnEncoder {
    fn width(&self) -> usize {
        match self {
            Self::Numeric { .. } => 1,
            Self::Categorical { categories, .. } => categories.len(),
        }
    }
}

/// Imputation and encoding learned from training rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedPreprocessor {
    table: &'static str,
    encoders: Vec<ColumnEncoder>,
}

impl FittedPreprocessor {
    /// Learns medians, modes, vocabularies, and scales from `records`.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::InsufficientData`] for an empty training set and
    /// [`ChurnError::SchemaMismatch`] when a schema column is not a model input
    /// of the declared kind.
    pub fn fit(schema: &FeatureSchema, records: &[&FeatureRecord]) -> Result<Self, ChurnError> {
        if records.is_empty() {
            return Err(ChurnError::InsufficientData(
                "cannot fit preprocessing on zero rows".to_string(),
            ));
        }

        let mut encoders = Vec::new();

        for &(name, kind) in schema.columns {
            let encoder = match kind {
                ColumnKind::Identifier | ColumnKind::Label => continue,
                ColumnKind::Numeric => {
                    let values = records
                        .iter()
                        .map(|r| numeric(schema, r, name))
                        .collect::<Result<Vec<_>, _>>()?;
                    fit_numeric(name, &values)
                }
                ColumnKind::Categorical => {
                    let values = records
                        .iter()
                        .map(|r| categorical(schema, r, name))
                        .collect::<Result<Vec<_>, _>>()?;
                    fit_categorical(name, &values)
                }
            };
            encoders.push(encoder);
        }

        Ok(Self {
            table: schema.table,
            encoders,
        })
    }

    /// Number of encoded values per row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.encoders.iter().map(ColumnEncoder::width).sum()
    }

    /// Names of the encoded columns, `column=category` for one-hot slots.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.encoders
            .iter()
            .flat_map(|encoder| match encoder {
                ColumnEncoder::Numeric { name, .. } => vec![(*name).to_string()],
                ColumnEncoder::Categorical {
                    name, categories, ..
                } => categories.iter().map(|c| format!("{name}={c}")).collect(),
            })
            .collect()
    }

    #[must_use]
    pub fn encoders(&self) -> &[ColumnEncoder] {
        &self.encoders
    }

    /// Encodes one record.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::SchemaMismatch`] if the record lacks a fitted column.
    pub fn transform(&self, record: &FeatureRecord) -> Result<Vec<f32>, ChurnError> {
        let mut row = Vec::with_capacity(self.width());

        for encoder in &self.encoders {
            match encoder {
                ColumnEncoder::Numeric {
                    name,
                    median,
                    mean,
                    scale,
                } => {
                    let value = match record.value(name) {
                        Some(FeatureValue::Number(value)) => value.unwrap_or(*median),
                        _ => return Err(self.mismatch(name)),
                    };
                    #[expect(clippy::cast_possible_truncation, reason = "tensors are f32")]
                    let scaled = ((value - mean) / scale) as f32;
                    row.push(scaled);
                }
                ColumnEncoder::Categorical {
                    name,
                    mode,
                    categories,
                } => {
                    let value = match record.value(name) {
                        Some(FeatureValue::Category(value)) => value,
                        _ => return Err(self.mismatch(name)),
                    };
                    let value = value.as_deref().unwrap_or(mode.as_str());
                    row.extend(
                        categories
                            .iter()
                            .map(|c| if c == value { 1.0 } else { 0.0 }),
                    );
                }
            }
        }

        Ok(row)
    }

    fn mismatch(&self, column: &str) -> ChurnError {
        ChurnError::SchemaMismatch {
            table: self.table.to_string(),
            missing: vec![column.to_string()],
        }
    }
}

fn numeric(
    schema: &FeatureSchema,
    record: &FeatureRecord,
    name: &str,
) -> Result<Option<f64>, ChurnError> {
    match record.value(name) {
        Some(FeatureValue::Number(value)) => Ok(value.filter(|v| v.is_finite())),
        _ => Err(kind_mismatch(schema, name)),
    }
}

fn categorical(
    schema: &FeatureSchema,
    record: &FeatureRecord,
    name: &str,
) -> Result<Option<String>, ChurnError> {
    match record.value(name) {
        Some(FeatureValue::Category(value)) => Ok(value.map(|v| v.into_owned())),
        _ => Err(kind_mismatch(schema, name)),
    }
}

fn kind_mismatch(schema: &FeatureSchema, name: &str) -> ChurnError {
    ChurnError::SchemaMismatch {
        table: schema.table.to_string(),
        missing: vec![name.to_string()],
    }
}

fn fit_numeric(name: &'static str, values: &[Option<f64>]) -> ColumnEncoder {
    let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
    observed.sort_by(f64::total_cmp);
    let median = median(&observed);

    let imputed: Vec<f64> = values.iter().map(|v| v.unwrap_or(median)).collect();
    let n = imputed.len() as f64;
    let mean = imputed.iter().sum::<f64>() / n;
    let variance = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    ColumnEncoder::Numeric {
        name,
        median,
        mean,
        scale: if std > MIN_SCALE { std } else { 1.0 },
    }
}

/// Median of sorted values, averaging the middle pair; 0 when empty.
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

fn fit_categorical(name: &'static str, values: &[Option<String>]) -> ColumnEncoder {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }

    // Ascending iteration with a strict comparison keeps the smallest value on ties.
    let mut mode: Option<(&str, usize)> = None;
    for (&value, &count) in &counts {
        if mode.is_none_or(|(_, best)| count > best) {
            mode = Some((value, count));
        }
    }
    let mode = mode.map_or(MISSING_CATEGORY, |(value, _)| value).to_string();

    let mut categories: BTreeSet<String> = counts.keys().map(|c| (*c).to_string()).collect();
    if values.iter().any(Option::is_none) {
        categories.insert(mode.clone());
    }

    ColumnEncoder::Categorical {
        name,
        mode,
        categories: categories.into_iter().collect(),
    }
}
