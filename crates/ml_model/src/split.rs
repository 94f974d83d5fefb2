//! Seeded, stratified train/test split.

use churn_structs::ChurnError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices of the two halves of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Splits row indices so each class keeps its proportion in both halves.
///
/// Every class contributes `round(n_c * test_size)` rows to the test half,
/// kept within `[1, n_c - 1]` so neither half loses a class. The same labels,
/// `test_size`, and `seed` always produce the same split.
///
/// # Errors
///
/// Returns [`ChurnError::InsufficientData`] when `test_size` is outside
/// `(0, 1)`, when fewer than two classes are present, or when a class has
/// fewer than two rows.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> Result<Split, ChurnError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ChurnError::InsufficientData(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let mut classes: Vec<u8> = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();

    if classes.len() < 2 {
        return Err(ChurnError::InsufficientData(format!(
            "need two label classes to stratify, found {}",
            classes.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for class in classes {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();

        if members.len() < 2 {
            return Err(ChurnError::InsufficientData(format!(
                "label class {class} has {} row(s); at least 2 are needed",
                members.len()
            )));
        }

        members.shuffle(&mut rng);

        let wanted = (members.len() as f64 * test_size).round();
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "non-negative and bounded by the class size"
        )]
        let n_test = (wanted as usize).clamp(1, members.len() - 1);

        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(Split { train, test })
}
