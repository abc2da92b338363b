//! Seeded train/test splits
//!
//! Both splits are pure functions of their inputs and seed, so a training
//! run can be reproduced exactly.

use std::collections::BTreeMap;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::error::{PredictorError, PredictorResult};

/// Row indices of the two partitions; disjoint and together covering all rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn check_fraction(test_fraction: f64) -> PredictorResult<()> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PredictorError::InvalidInput(format!(
            "Test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    Ok(())
}

/// Shuffle `0..n` and hold out `ceil(n * test_fraction)` rows
///
/// Both sides always get at least one row.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> PredictorResult<SplitIndices> {
    check_fraction(test_fraction)?;
    if n < 2 {
        return Err(PredictorError::InvalidInput(format!(
            "Need at least 2 records to split, got {}",
            n
        )));
    }

    let n_test = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n - 1);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

/// Split each class separately so both sides keep the class proportions
///
/// Each class contributes `round(count * test_fraction)` rows to the test set.
pub fn stratified_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> PredictorResult<SplitIndices> {
    check_fraction(test_fraction)?;

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(row);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for rows in by_class.values_mut() {
        rows.shuffle(&mut rng);
        let n_test = (rows.len() as f64 * test_fraction).round() as usize;
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    if test.is_empty() || train.is_empty() {
        return Err(PredictorError::InvalidInput(format!(
            "Stratified split of {} records left an empty partition",
            labels.len()
        )));
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    Ok(SplitIndices { train, test })
}
