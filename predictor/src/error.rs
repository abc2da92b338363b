//! Error handling for the AgriSense prediction engine
//!
//! Every failure is surfaced to the caller; nothing here is retried.

use serde::Serialize;
use thiserror::Error;

/// Prediction engine error types
#[derive(Error, Debug)]
pub enum PredictorError {
    // Lifecycle errors
    #[error("Model must be trained before {capability} inference")]
    NotTrained { capability: &'static str },

    // Input errors
    #[error("Malformed record {record_id}: {message}")]
    MalformedRecord { record_id: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Persistence errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    // Image detection errors
    #[error("Unknown class label: {0}")]
    UnknownClassLabel(String),

    #[error("Disease detection error: {0}")]
    Detection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PredictorError {
    pub fn malformed(record_id: impl Into<String>, message: impl Into<String>) -> Self {
        PredictorError::MalformedRecord {
            record_id: record_id.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for logs and reports
    pub fn code(&self) -> &'static str {
        match self {
            PredictorError::NotTrained { .. } => "NOT_TRAINED",
            PredictorError::MalformedRecord { .. } => "MALFORMED_RECORD",
            PredictorError::InvalidInput(_) => "INVALID_INPUT",
            PredictorError::Persistence(_) => "PERSISTENCE_ERROR",
            PredictorError::Dataset(_) => "DATASET_ERROR",
            PredictorError::UnknownClassLabel(_) => "UNKNOWN_CLASS_LABEL",
            PredictorError::Detection(_) => "DETECTION_ERROR",
            PredictorError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Code and message pair reported when a run fails
    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Serializable error summary
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl From<config::ConfigError> for PredictorError {
    fn from(e: config::ConfigError) -> Self {
        PredictorError::Configuration(e.to_string())
    }
}

/// Result type alias for engine operations
pub type PredictorResult<T> = Result<T, PredictorError>;
