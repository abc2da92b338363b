//! Crop yield regression
//!
//! Features are standardised with a scaler fitted on the training split only,
//! then fed to a bagged forest. The forest's per-tree disagreement drives the
//! confidence score.

use ndarray::{Array1, Axis};

use super::feature_engineering::FeatureEngineer;
use crate::config::TrainingConfig;
use crate::error::{PredictorError, PredictorResult};
use crate::ml::{
    r2_score, train_test_split, ForestParams, RandomForestRegressor, Spread, StandardScaler,
    SubEstimates, TreeParams,
};
use shared::{
    FeatureImportance, Observation, YieldFeatures, YieldPrediction, YieldTrainingReport,
    YIELD_FEATURE_COUNT, YIELD_FEATURE_NAMES,
};

/// Used when the model cannot report per-member estimates
pub const DEFAULT_CONFIDENCE: f64 = 0.8;
pub const MAX_CONFIDENCE: f64 = 0.99;

/// `1 / (1 + std_dev)` of the member estimates, capped at [`MAX_CONFIDENCE`]
pub fn confidence_from_spread(spread: Option<Spread>) -> f64 {
    match spread {
        Some(s) => (1.0 / (1.0 + s.std_dev)).min(MAX_CONFIDENCE),
        None => DEFAULT_CONFIDENCE,
    }
}

/// Fitted scaler and forest
#[derive(Debug, Clone, PartialEq)]
pub struct YieldModel {
    scaler: StandardScaler,
    forest: RandomForestRegressor,
}

impl YieldModel {
    /// Reassemble a model from persisted parts
    pub fn from_parts(
        scaler: StandardScaler,
        forest: RandomForestRegressor,
    ) -> PredictorResult<Self> {
        if scaler.n_features() != YIELD_FEATURE_COUNT
            || forest.n_features() != YIELD_FEATURE_COUNT
        {
            return Err(PredictorError::Persistence(format!(
                "Yield model expects {} features, scaler has {} and forest has {}",
                YIELD_FEATURE_COUNT,
                scaler.n_features(),
                forest.n_features()
            )));
        }
        Ok(Self { scaler, forest })
    }

    pub fn fit(
        engineer: &FeatureEngineer,
        observations: &[Observation],
        training: &TrainingConfig,
    ) -> PredictorResult<(Self, YieldTrainingReport)> {
        tracing::info!(records = observations.len(), "Training crop yield prediction model");

        let x = engineer.extract(observations)?;
        let y: Vec<f64> = observations.iter().map(|o| o.yield_tons_per_hectare).collect();
        if y.iter().any(|v| !v.is_finite()) {
            return Err(PredictorError::InvalidInput(
                "Yield targets must be finite numbers".to_string(),
            ));
        }

        let split =
            train_test_split(observations.len(), training.test_fraction, training.split_seed)?;
        tracing::debug!(
            train = split.train.len(),
            test = split.test.len(),
            "Yield train/test split"
        );

        let x_train = x.select(Axis(0), &split.train);
        let x_test = x.select(Axis(0), &split.test);
        let y_train: Vec<f64> = split.train.iter().map(|&i| y[i]).collect();
        let y_test: Vec<f64> = split.test.iter().map(|&i| y[i]).collect();

        let scaler = StandardScaler::fit(x_train.view())?;
        let x_train = scaler.transform(x_train.view())?;
        let x_test = scaler.transform(x_test.view())?;

        let params = ForestParams {
            n_estimators: training.n_estimators,
            tree: TreeParams {
                max_depth: training.max_depth,
                min_samples_split: training.min_samples_split,
            },
            seed: training.forest_seed,
        };
        let forest = RandomForestRegressor::fit(params, x_train.view(), &y_train)?;

        let train_r2 = r2_score(&y_train, &forest.predict(x_train.view())?)?;
        let test_r2 = r2_score(&y_test, &forest.predict(x_test.view())?)?;

        let mut feature_importance: Vec<FeatureImportance> = YIELD_FEATURE_NAMES
            .iter()
            .zip(forest.feature_importances())
            .map(|(name, importance)| FeatureImportance {
                feature: name.to_string(),
                importance: *importance,
            })
            .collect();
        feature_importance.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        tracing::info!(train_r2, test_r2, "Yield model trained");
        for f in feature_importance.iter().take(5) {
            tracing::info!(feature = %f.feature, importance = f.importance, "Feature importance");
        }

        let report = YieldTrainingReport {
            train_r2,
            test_r2,
            feature_importance,
            train_samples: split.train.len(),
            test_samples: split.test.len(),
        };
        Ok((Self { scaler, forest }, report))
    }

    pub fn predict(
        &self,
        engineer: &FeatureEngineer,
        obs: &Observation,
    ) -> PredictorResult<YieldPrediction> {
        let features = engineer.extract_one(obs)?;
        self.predict_features(&features)
    }

    pub fn predict_features(&self, features: &YieldFeatures) -> PredictorResult<YieldPrediction> {
        let row = Array1::from(features.to_array().to_vec()).insert_axis(Axis(0));
        let scaled = self.scaler.transform(row.view())?;
        let scaled_row = scaled.row(0);

        let predicted_yield = self.forest.predict_row(scaled_row)?;
        let confidence = confidence_from_spread(self.forest.spread(scaled_row));

        Ok(YieldPrediction {
            predicted_yield,
            confidence,
        })
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn forest(&self) -> &RandomForestRegressor {
        &self.forest
    }

    pub fn into_parts(self) -> (StandardScaler, RandomForestRegressor) {
        (self.scaler, self.forest)
    }
}
