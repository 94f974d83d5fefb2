//! Operating-threshold selection from held-out predictions.

use churn_structs::ChurnError;
use serde::Serialize;

/// Added to the F1 denominator so zero precision and recall yield 0.
const F1_EPSILON: f64 = 1e-12;

/// Precision and recall at every distinct score, thresholds ascending.
///
/// `precision` and `recall` carry one extra trailing point `(1, 0)` that has
/// no threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecisionRecallCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// Checks that labels and probabilities can be ranked.
pub(crate) fn validate_scores(labels: &[u8], probas: &[f64]) -> Result<(), ChurnError> {
    if labels.is_empty() {
        return Err(ChurnError::DegenerateScoreDistribution(
            "no held-out predictions".to_string(),
        ));
    }
    if labels.len() != probas.len() {
        return Err(ChurnError::DegenerateScoreDistribution(format!(
            "{} labels but {} probabilities",
            labels.len(),
            probas.len()
        )));
    }
    if let Some(bad) = probas.iter().find(|p| !p.is_finite()) {
        return Err(ChurnError::DegenerateScoreDistribution(format!(
            "non-finite probability {bad}"
        )));
    }
    Ok(())
}

/// Row indices ordered by descending score; equal scores keep input order.
fn descending_order(probas: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..probas.len()).collect();
    order.sort_by(|&a, &b| probas[b].total_cmp(&probas[a]));
    order
}

/// Computes the precision-recall curve.
///
/// With no positive labels, recall is 1 at every threshold.
///
/// # Errors
///
/// Returns [`ChurnError::DegenerateScoreDistribution`] for empty, misaligned,
/// or non-finite input.
pub fn precision_recall_curve(
    labels: &[u8],
    probas: &[f64],
) -> Result<PrecisionRecallCurve, ChurnError> {
    validate_scores(labels, probas)?;

    let order = descending_order(probas);

    // Cumulative counts at the last row of each distinct score, highest first.
    let mut true_positives = Vec::new();
    let mut false_positives = Vec::new();
    let mut thresholds = Vec::new();
    let (mut tp, mut fp) = (0_usize, 0_usize);

    for (k, &i) in order.iter().enumerate() {
        if labels[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }

        let last_of_score = order
            .get(k + 1)
            .is_none_or(|&next| probas[next].total_cmp(&probas[i]).is_ne());
        if last_of_score {
            true_positives.push(tp);
            false_positives.push(fp);
            thresholds.push(probas[i]);
        }
    }

    let total_positives = tp;

    let mut precision: Vec<f64> = true_positives
        .iter()
        .zip(&false_positives)
        .map(|(&tp, &fp)| {
            let predicted = tp + fp;
            if predicted == 0 {
                0.0
            } else {
                tp as f64 / predicted as f64
            }
        })
        .collect();

    let mut recall: Vec<f64> = true_positives
        .iter()
        .map(|&tp| {
            if total_positives == 0 {
                1.0
            } else {
                tp as f64 / total_positives as f64
            }
        })
        .collect();

    precision.reverse();
    recall.reverse();
    thresholds.reverse();

    precision.push(1.0);
    recall.push(0.0);

    Ok(PrecisionRecallCurve {
        precision,
        recall,
        thresholds,
    })
}

/// Returns the index of the largest non-NaN value, first one on ties.
fn stable_nan_argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i)
}

/// Picks the threshold with the highest F1 on held-out predictions.
///
/// F1 is evaluated at every curve point that has a threshold. The result is
/// always within `[0, 1]`.
///
/// # Errors
///
/// Returns [`ChurnError::DegenerateScoreDistribution`] when the curve cannot
/// be built or no point has a defined F1.
pub fn choose_threshold_max_f1(labels: &[u8], probas: &[f64]) -> Result<f64, ChurnError> {
    let curve = precision_recall_curve(labels, probas)?;

    let f1: Vec<f64> = (0..curve.thresholds.len())
        .map(|i| {
            let (p, r) = (curve.precision[i], curve.recall[i]);
            2.0 * p * r / (p + r + F1_EPSILON)
        })
        .collect();

    let best = stable_nan_argmax(&f1).ok_or_else(|| {
        ChurnError::DegenerateScoreDistribution("no candidate threshold has a defined F1".to_string())
    })?;

    Ok(curve.thresholds[best].clamp(0.0, 1.0))
}
