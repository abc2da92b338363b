//! Disease risk classification from environmental conditions

use std::collections::BTreeMap;

use ndarray::{Array1, Axis};

use super::feature_engineering::FeatureEngineer;
use crate::config::TrainingConfig;
use crate::error::{PredictorError, PredictorResult};
use crate::ml::tree::argmax;
use crate::ml::{accuracy, stratified_split, DecisionTreeClassifier, TreeParams};
use shared::{
    DiseaseRiskPrediction, DiseaseTrainingReport, EnvironmentalConditions, Observation, RiskLevel,
    DISEASE_FEATURE_COUNT,
};

/// Decision tree over the three risk levels, trained on unscaled features
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseRiskModel {
    tree: DecisionTreeClassifier,
}

impl DiseaseRiskModel {
    pub fn from_tree(tree: DecisionTreeClassifier) -> PredictorResult<Self> {
        if tree.n_classes() != RiskLevel::ALL.len() || tree.n_features() != DISEASE_FEATURE_COUNT {
            return Err(PredictorError::Persistence(format!(
                "Disease model expects {} classes over {} features, found {} over {}",
                RiskLevel::ALL.len(),
                DISEASE_FEATURE_COUNT,
                tree.n_classes(),
                tree.n_features()
            )));
        }
        Ok(Self { tree })
    }

    pub fn fit(
        engineer: &FeatureEngineer,
        observations: &[Observation],
        training: &TrainingConfig,
    ) -> PredictorResult<(Self, DiseaseTrainingReport)> {
        tracing::info!(records = observations.len(), "Training disease risk classification model");

        let x = engineer.disease_matrix(observations)?;
        let labels: Vec<usize> = observations.iter().map(|o| o.risk_level().index()).collect();

        let mut class_counts: BTreeMap<String, usize> =
            RiskLevel::ALL.iter().map(|r| (r.as_str().to_string(), 0)).collect();
        for obs in observations {
            *class_counts.entry(obs.risk_level().as_str().to_string()).or_default() += 1;
        }

        let split = stratified_split(&labels, training.test_fraction, training.split_seed)?;
        tracing::debug!(
            train = split.train.len(),
            test = split.test.len(),
            "Disease stratified split"
        );

        let x_train = x.select(Axis(0), &split.train);
        let x_test = x.select(Axis(0), &split.test);
        let y_train: Vec<usize> = split.train.iter().map(|&i| labels[i]).collect();
        let y_test: Vec<usize> = split.test.iter().map(|&i| labels[i]).collect();

        let params = TreeParams {
            max_depth: training.max_depth,
            min_samples_split: training.min_samples_split,
        };
        let tree =
            DecisionTreeClassifier::fit(params, x_train.view(), &y_train, RiskLevel::ALL.len())?;

        let train_accuracy = accuracy(&y_train, &tree.predict(x_train.view())?)?;
        let test_accuracy = accuracy(&y_test, &tree.predict(x_test.view())?)?;

        tracing::info!(train_accuracy, test_accuracy, "Disease model trained");

        let report = DiseaseTrainingReport {
            train_accuracy,
            test_accuracy,
            train_samples: split.train.len(),
            test_samples: split.test.len(),
            class_counts,
        };
        Ok((Self { tree }, report))
    }

    pub fn predict(
        &self,
        engineer: &FeatureEngineer,
        env: &EnvironmentalConditions,
    ) -> PredictorResult<DiseaseRiskPrediction> {
        let features = engineer.disease_features(env).to_array();
        if features.iter().any(|v| !v.is_finite()) {
            return Err(PredictorError::InvalidInput(
                "Environmental readings must be finite numbers".to_string(),
            ));
        }
        let row = Array1::from(features.to_vec());
        let proba = self.tree.predict_proba_row(row.view())?;

        let best = argmax(&proba);
        let risk_level = RiskLevel::from_index(best).ok_or_else(|| {
            PredictorError::InvalidInput(format!("Classifier produced unknown class {}", best))
        })?;

        let probabilities = RiskLevel::ALL
            .iter()
            .map(|r| (r.as_str().to_string(), proba[r.index()]))
            .collect();

        Ok(DiseaseRiskPrediction {
            risk_level,
            probabilities,
            confidence: proba[best],
        })
    }

    pub fn tree(&self) -> &DecisionTreeClassifier {
        &self.tree
    }

    pub fn into_tree(self) -> DecisionTreeClassifier {
        self.tree
    }
}
