//! AgriSense prediction engine
//!
//! Tabular crop intelligence for Kenyan agriculture: yield regression and
//! disease risk classification trained on agronomic records, plus the
//! boundary to the leaf-image disease detector.

pub mod config;
pub mod error;
pub mod external;
pub mod ml;
pub mod services;

pub use config::Config;
pub use error::{PredictorError, PredictorResult};
pub use services::{CropPredictor, FeatureEngineer, SyntheticDataGenerator, TrainingState};
