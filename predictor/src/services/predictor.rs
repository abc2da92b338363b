//! Crop predictor facade
//!
//! Owns the fitted pipeline (scaler, yield forest, disease tree) and decides
//! when each inference path is allowed to run.

use std::path::Path;

use serde::Serialize;

use super::disease_model::DiseaseRiskModel;
use super::feature_engineering::FeatureEngineer;
use super::persistence::{load_artifact, save_artifact, PipelineArtifact};
use super::yield_model::YieldModel;
use crate::config::{Config, FeatureConfig, ReadinessPolicy, TrainingConfig};
use crate::error::{PredictorError, PredictorResult};
use shared::{
    DiseaseRiskPrediction, DiseaseTrainingReport, EnvironmentalConditions, Observation,
    TrainingReport, YieldPrediction, YieldTrainingReport,
};

/// Which models currently hold fitted parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrainingState {
    Untrained,
    YieldTrained,
    DiseaseTrained,
    FullyTrained,
}

impl TrainingState {
    fn of(yield_ready: bool, disease_ready: bool) -> Self {
        match (yield_ready, disease_ready) {
            (false, false) => TrainingState::Untrained,
            (true, false) => TrainingState::YieldTrained,
            (false, true) => TrainingState::DiseaseTrained,
            (true, true) => TrainingState::FullyTrained,
        }
    }

    pub fn is_fully_trained(&self) -> bool {
        matches!(self, TrainingState::FullyTrained)
    }
}

/// Trains, serves and persists both tabular models
///
/// Not synchronised: callers sharing one predictor across threads must wrap
/// it in their own lock.
#[derive(Debug, Clone)]
pub struct CropPredictor {
    engineer: FeatureEngineer,
    training: TrainingConfig,
    yield_model: Option<YieldModel>,
    disease_model: Option<DiseaseRiskModel>,
}

impl CropPredictor {
    pub fn new(features: FeatureConfig, training: TrainingConfig) -> Self {
        Self {
            engineer: FeatureEngineer::new(features),
            training,
            yield_model: None,
            disease_model: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.features.clone(), config.training.clone())
    }

    pub fn state(&self) -> TrainingState {
        TrainingState::of(self.yield_model.is_some(), self.disease_model.is_some())
    }

    pub fn is_fitted(&self) -> bool {
        self.state().is_fully_trained()
    }

    pub fn readiness(&self) -> ReadinessPolicy {
        self.training.readiness
    }

    pub fn feature_engineer(&self) -> &FeatureEngineer {
        &self.engineer
    }

    fn validate_training(&self) -> PredictorResult<()> {
        self.training
            .validate()
            .map_err(|e| PredictorError::InvalidInput(e.to_string()))
    }

    /// Train both models; nothing changes unless both succeed
    pub fn train(&mut self, observations: &[Observation]) -> PredictorResult<TrainingReport> {
        self.validate_training()?;

        let (yield_model, yield_report) =
            YieldModel::fit(&self.engineer, observations, &self.training)?;
        let (disease_model, disease_report) =
            DiseaseRiskModel::fit(&self.engineer, observations, &self.training)?;

        self.yield_model = Some(yield_model);
        self.disease_model = Some(disease_model);
        tracing::info!(state = ?self.state(), "Training complete");

        Ok(TrainingReport {
            yield_model: yield_report,
            disease_model: disease_report,
        })
    }

    /// Train only the yield model, keeping any fitted disease model
    pub fn train_yield(
        &mut self,
        observations: &[Observation],
    ) -> PredictorResult<YieldTrainingReport> {
        self.validate_training()?;
        let (model, report) = YieldModel::fit(&self.engineer, observations, &self.training)?;
        self.yield_model = Some(model);
        tracing::info!(state = ?self.state(), "Yield model updated");
        Ok(report)
    }

    /// Train only the disease model, keeping any fitted yield model
    pub fn train_disease(
        &mut self,
        observations: &[Observation],
    ) -> PredictorResult<DiseaseTrainingReport> {
        self.validate_training()?;
        let (model, report) = DiseaseRiskModel::fit(&self.engineer, observations, &self.training)?;
        self.disease_model = Some(model);
        tracing::info!(state = ?self.state(), "Disease model updated");
        Ok(report)
    }

    fn ready_yield(&self) -> PredictorResult<&YieldModel> {
        let gated = self.readiness() == ReadinessPolicy::AllOrNothing && !self.is_fitted();
        match &self.yield_model {
            Some(model) if !gated => Ok(model),
            _ => Err(PredictorError::NotTrained { capability: "yield" }),
        }
    }

    fn ready_disease(&self) -> PredictorResult<&DiseaseRiskModel> {
        let gated = self.readiness() == ReadinessPolicy::AllOrNothing && !self.is_fitted();
        match &self.disease_model {
            Some(model) if !gated => Ok(model),
            _ => Err(PredictorError::NotTrained {
                capability: "disease risk",
            }),
        }
    }

    pub fn predict_yield(&self, obs: &Observation) -> PredictorResult<YieldPrediction> {
        self.ready_yield()?.predict(&self.engineer, obs)
    }

    pub fn predict_disease_risk(
        &self,
        env: &EnvironmentalConditions,
    ) -> PredictorResult<DiseaseRiskPrediction> {
        self.ready_disease()?.predict(&self.engineer, env)
    }

    /// Snapshot of the fitted pipeline
    pub fn to_artifact(&self) -> PipelineArtifact {
        let (scaler, forest) = match &self.yield_model {
            Some(m) => (Some(m.scaler().clone()), Some(m.forest().clone())),
            None => (None, None),
        };
        PipelineArtifact {
            scaler,
            yield_model: forest,
            disease_model: self.disease_model.as_ref().map(|m| m.tree().clone()),
            is_fitted: self.is_fitted(),
        }
    }

    /// Replace the in-memory pipeline; on error the current one is kept
    pub fn restore(&mut self, artifact: PipelineArtifact) -> PredictorResult<()> {
        let yield_model = match (artifact.scaler, artifact.yield_model) {
            (Some(scaler), Some(forest)) => Some(YieldModel::from_parts(scaler, forest)?),
            (None, None) => None,
            _ => {
                return Err(PredictorError::Persistence(
                    "Scaler and yield model must be restored together".to_string(),
                ))
            }
        };
        let disease_model = artifact
            .disease_model
            .map(DiseaseRiskModel::from_tree)
            .transpose()?;

        let restored = TrainingState::of(yield_model.is_some(), disease_model.is_some());
        if artifact.is_fitted != restored.is_fully_trained() {
            return Err(PredictorError::Persistence(format!(
                "Fitted flag {} contradicts stored models ({:?})",
                artifact.is_fitted, restored
            )));
        }

        self.yield_model = yield_model;
        self.disease_model = disease_model;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> PredictorResult<()> {
        save_artifact(path.as_ref(), &self.to_artifact())
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> PredictorResult<()> {
        let artifact = load_artifact(path.as_ref())?;
        self.restore(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_fitted_models() {
        assert_eq!(TrainingState::of(false, false), TrainingState::Untrained);
        assert_eq!(TrainingState::of(true, false), TrainingState::YieldTrained);
        assert_eq!(TrainingState::of(false, true), TrainingState::DiseaseTrained);
        assert!(TrainingState::of(true, true).is_fully_trained());
    }

    #[test]
    fn fresh_predictor_refuses_inference() {
        let predictor = CropPredictor::new(FeatureConfig::default(), TrainingConfig::default());
        assert_eq!(predictor.state(), TrainingState::Untrained);

        let env = EnvironmentalConditions {
            humidity: 85.0,
            temperature: 28.0,
            rainfall: 120.0,
            soil_ph: 6.0,
            soil_moisture: Some(80.0),
        };
        assert!(matches!(
            predictor.predict_disease_risk(&env),
            Err(PredictorError::NotTrained { .. })
        ));
    }

    #[test]
    fn restore_rejects_inconsistent_flag() {
        let mut predictor = CropPredictor::new(FeatureConfig::default(), TrainingConfig::default());
        let artifact = PipelineArtifact {
            scaler: None,
            yield_model: None,
            disease_model: None,
            is_fitted: true,
        };
        assert!(predictor.restore(artifact).is_err());
        assert_eq!(predictor.state(), TrainingState::Untrained);
    }
}
