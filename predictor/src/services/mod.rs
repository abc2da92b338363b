//! Prediction services for the AgriSense engine

pub mod agronomy;
pub mod dataset;
pub mod disease_model;
pub mod feature_engineering;
pub mod persistence;
pub mod predictor;
pub mod synthetic;
pub mod yield_model;

pub use agronomy::{assess_soil_health, SoilHealthReport};
pub use dataset::{read_csv, summarize, write_csv, DatasetSummary};
pub use disease_model::DiseaseRiskModel;
pub use feature_engineering::FeatureEngineer;
pub use persistence::PipelineArtifact;
pub use predictor::{CropPredictor, TrainingState};
pub use synthetic::{yield_multiplier, SyntheticDataGenerator, YIELD_ADJUSTMENTS};
pub use yield_model::YieldModel;
