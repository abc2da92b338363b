//! Bagged regression forest

use ndarray::{ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTreeRegressor, TreeParams};
use super::SubEstimates;
use crate::error::{PredictorError, PredictorResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub tree: TreeParams,
    /// Seed for the bootstrap draws
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
            seed: 42,
        }
    }
}

/// Averages regression trees grown on bootstrap resamples
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForestRegressor {
    params: ForestParams,
    trees: Vec<DecisionTreeRegressor>,
    feature_importances: Vec<f64>,
}

impl RandomForestRegressor {
    pub fn fit(params: ForestParams, x: ArrayView2<f64>, y: &[f64]) -> PredictorResult<Self> {
        if params.n_estimators == 0 {
            return Err(PredictorError::InvalidInput(
                "Forest needs at least one estimator".to_string(),
            ));
        }
        let n = x.nrows();
        if n == 0 {
            return Err(PredictorError::InvalidInput(
                "Cannot fit a forest on zero rows".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(DecisionTreeRegressor::fit_samples(params.tree, x, y, bootstrap)?);
        }

        let mut importances = vec![0.0; x.ncols()];
        for tree in &trees {
            for (acc, v) in importances.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        tracing::debug!(
            trees = trees.len(),
            rows = n,
            features = x.ncols(),
            "Random forest fitted"
        );

        Ok(Self {
            params,
            trees,
            feature_importances: importances,
        })
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> PredictorResult<f64> {
        let estimates = self.tree_predictions(row)?;
        Ok(estimates.iter().sum::<f64>() / estimates.len() as f64)
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> PredictorResult<Vec<f64>> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// One prediction per member tree, in tree order
    pub fn tree_predictions(&self, row: ArrayView1<f64>) -> PredictorResult<Vec<f64>> {
        self.trees.iter().map(|t| t.predict_row(row)).collect()
    }

    /// Mean of the per-tree importances, renormalised to sum to 1
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_importances.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

impl SubEstimates for RandomForestRegressor {
    fn sub_estimates(&self, row: ArrayView1<f64>) -> Option<Vec<f64>> {
        self.tree_predictions(row).ok()
    }
}
