//! Fitted pipeline artifact
//!
//! One JSON document holds the scaler, both models and the fitted flag,
//! guarded by a format version and a SHA-256 checksum of those four fields.
//! Writes go to a sibling temp file that is renamed into place, so a reader
//! never sees a half-written artifact.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{PredictorError, PredictorResult};
use crate::ml::{DecisionTreeClassifier, RandomForestRegressor, StandardScaler};

pub const FORMAT_VERSION: u32 = 1;

/// Keys every artifact must carry
pub const REQUIRED_KEYS: [&str; 6] = [
    "format_version",
    "checksum",
    "scaler",
    "yield_model",
    "disease_model",
    "is_fitted",
];

/// Everything needed to restore a predictor; absent parts are untrained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub scaler: Option<StandardScaler>,
    pub yield_model: Option<RandomForestRegressor>,
    pub disease_model: Option<DecisionTreeClassifier>,
    pub is_fitted: bool,
}

#[derive(Serialize, Deserialize)]
struct ArtifactFile {
    format_version: u32,
    checksum: String,
    scaler: Option<StandardScaler>,
    yield_model: Option<RandomForestRegressor>,
    disease_model: Option<DecisionTreeClassifier>,
    is_fitted: bool,
}

impl ArtifactFile {
    fn into_pipeline(self) -> PipelineArtifact {
        PipelineArtifact {
            scaler: self.scaler,
            yield_model: self.yield_model,
            disease_model: self.disease_model,
            is_fitted: self.is_fitted,
        }
    }
}

fn checksum(pipeline: &PipelineArtifact) -> PredictorResult<String> {
    let bytes = serde_json::to_vec(pipeline)
        .map_err(|e| PredictorError::Persistence(format!("Failed to serialize pipeline: {}", e)))?;
    Ok(STANDARD.encode(Sha256::digest(&bytes)))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "artifact".into());
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn save_artifact(path: &Path, pipeline: &PipelineArtifact) -> PredictorResult<()> {
    let file = ArtifactFile {
        format_version: FORMAT_VERSION,
        checksum: checksum(pipeline)?,
        scaler: pipeline.scaler.clone(),
        yield_model: pipeline.yield_model.clone(),
        disease_model: pipeline.disease_model.clone(),
        is_fitted: pipeline.is_fitted,
    };
    let bytes = serde_json::to_vec(&file)
        .map_err(|e| PredictorError::Persistence(format!("Failed to serialize artifact: {}", e)))?;

    let tmp = temp_sibling(path);
    fs::write(&tmp, bytes).map_err(|e| {
        PredictorError::Persistence(format!("Cannot write {}: {}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        PredictorError::Persistence(format!("Cannot move artifact to {}: {}", path.display(), e))
    })?;

    tracing::info!(path = %path.display(), is_fitted = pipeline.is_fitted, "Model saved");
    Ok(())
}

pub fn load_artifact(path: &Path) -> PredictorResult<PipelineArtifact> {
    let raw = fs::read(path).map_err(|e| {
        PredictorError::Persistence(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let value: serde_json::Value = serde_json::from_slice(&raw)
        .map_err(|e| PredictorError::Persistence(format!("Artifact is not valid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| PredictorError::Persistence("Artifact must be a JSON object".to_string()))?;
    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|k| !object.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        return Err(PredictorError::Persistence(format!(
            "Artifact is missing keys: {}",
            missing.join(", ")
        )));
    }

    let file: ArtifactFile = serde_json::from_value(value)
        .map_err(|e| PredictorError::Persistence(format!("Artifact schema mismatch: {}", e)))?;

    if file.format_version != FORMAT_VERSION {
        return Err(PredictorError::Persistence(format!(
            "Unsupported artifact version {} (expected {})",
            file.format_version, FORMAT_VERSION
        )));
    }
    let expected = file.checksum.clone();
    let pipeline = file.into_pipeline();
    if checksum(&pipeline)? != expected {
        return Err(PredictorError::Persistence(
            "Artifact checksum does not match its contents".to_string(),
        ));
    }

    let p = &pipeline;
    if p.is_fitted && (p.scaler.is_none() || p.yield_model.is_none() || p.disease_model.is_none()) {
        return Err(PredictorError::Persistence(
            "Artifact is marked fitted but a component is missing".to_string(),
        ));
    }
    if p.scaler.is_some() != p.yield_model.is_some() {
        return Err(PredictorError::Persistence(
            "Scaler and yield model must be stored together".to_string(),
        ));
    }

    tracing::info!(path = %path.display(), is_fitted = p.is_fitted, "Model loaded");
    Ok(pipeline)
}
