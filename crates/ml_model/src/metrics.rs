//! Held-out ranking metrics.

use churn_structs::ChurnError;

use crate::threshold::{precision_recall_curve, validate_scores};

fn class_counts(labels: &[u8]) -> Result<(usize, usize), ChurnError> {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;

    if positives == 0 || negatives == 0 {
        return Err(ChurnError::DegenerateScoreDistribution(format!(
            "held-out set has a single class ({positives} positive, {negatives} negative)"
        )));
    }
    Ok((positives, negatives))
}

/// Area under the ROC curve.
///
/// Computed as the normalized Mann-Whitney statistic; tied scores share
/// their average rank.
///
/// # Errors
///
/// Returns [`ChurnError::DegenerateScoreDistribution`] when the input is
/// invalid or holds a single class.
pub fn roc_auc(labels: &[u8], probas: &[f64]) -> Result<f64, ChurnError> {
    validate_scores(labels, probas)?;
    let (positives, negatives) = class_counts(labels)?;

    let mut order: Vec<usize> = (0..probas.len()).collect();
    order.sort_by(|&a, &b| probas[a].total_cmp(&probas[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && probas[order[end]].total_cmp(&probas[order[start]]).is_eq() {
            end += 1;
        }

        // Ranks are 1-based; the tie group [start, end) shares their mean.
        let average_rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = order[start..end].iter().filter(|&&i| labels[i] == 1).count();
        positive_rank_sum += average_rank * tied_positives as f64;

        start = end;
    }

    let (p, n) = (positives as f64, negatives as f64);
    Ok((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Average precision: precision weighted by each step in recall.
///
/// # Errors
///
/// Returns [`ChurnError::DegenerateScoreDistribution`] when the input is
/// invalid or holds a single class.
pub fn average_precision(labels: &[u8], probas: &[f64]) -> Result<f64, ChurnError> {
    class_counts(labels)?;
    let curve = precision_recall_curve(labels, probas)?;

    Ok(curve
        .recall
        .windows(2)
        .zip(&curve.precision)
        .map(|(pair, precision)| (pair[0] - pair[1]) * precision)
        .sum())
}
