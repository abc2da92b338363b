//! Prediction results and training reports

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::RiskLevel;

/// Yield estimate for one observation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YieldPrediction {
    /// Tons per hectare
    pub predicted_yield: f64,
    /// 0.0-0.99, higher when the ensemble members agree
    pub confidence: f64,
}

/// Disease risk estimate for one set of environmental conditions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseRiskPrediction {
    pub risk_level: RiskLevel,
    /// Probability per class name; always holds all three classes
    pub probabilities: BTreeMap<String, f64>,
    /// Probability of the predicted class
    pub confidence: f64,
}

/// Importance score of one yield feature
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Outcome of fitting the yield model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YieldTrainingReport {
    pub train_r2: f64,
    pub test_r2: f64,
    /// Sorted by importance, highest first
    pub feature_importance: Vec<FeatureImportance>,
    pub train_samples: usize,
    pub test_samples: usize,
}

impl YieldTrainingReport {
    /// The `n` most important features
    pub fn top_features(&self, n: usize) -> &[FeatureImportance] {
        &self.feature_importance[..n.min(self.feature_importance.len())]
    }
}

/// Outcome of fitting the disease risk model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseTrainingReport {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    /// Number of observations per risk label across the whole training input
    pub class_counts: BTreeMap<String, usize>,
}

/// Outcome of fitting both models
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub yield_model: YieldTrainingReport,
    pub disease_model: DiseaseTrainingReport,
}
