//! Leaf-image disease detection
//!
//! The image classifier itself is an external collaborator. This module ranks
//! its per-class scores, joins them with the disease catalogue and builds
//! treatment reports. [`RemoteImageClassifier`] talks to a hosted inference
//! endpoint; any other backend plugs in through [`ImageClassifier`].

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::error::{PredictorError, PredictorResult};
use shared::{default_disease_catalog, DiseaseInfo, DiseasePrediction, TreatmentReport};

/// Class order of the bundled leaf classifier
pub const DEFAULT_CLASS_NAMES: [&str; 6] = [
    "healthy",
    "early_blight",
    "late_blight",
    "bacterial_spot",
    "mosaic_virus",
    "leaf_mold",
];

/// An image given either as a file on disk or as encoded bytes in memory
#[derive(Debug, Clone)]
pub enum ImageInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageInput {
    pub fn bytes(&self) -> PredictorResult<Cow<'_, [u8]>> {
        match self {
            ImageInput::Path(path) => std::fs::read(path).map(Cow::Owned).map_err(|e| {
                PredictorError::Detection(format!("Cannot read image {}: {}", path.display(), e))
            }),
            ImageInput::Bytes(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
        }
    }
}

/// Produces one score per class for an image
pub trait ImageClassifier {
    fn class_names(&self) -> &[String];

    /// Scores in `class_names()` order
    fn class_scores(&self, image: &ImageInput) -> PredictorResult<Vec<f64>>;
}

pub struct PlantDiseaseDetector<C> {
    classifier: C,
    catalog: HashMap<String, DiseaseInfo>,
}

impl<C: ImageClassifier> PlantDiseaseDetector<C> {
    pub fn new(classifier: C) -> Self {
        Self::with_catalog(classifier, default_disease_catalog())
    }

    pub fn with_catalog(classifier: C, catalog: HashMap<String, DiseaseInfo>) -> Self {
        Self { classifier, catalog }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Catalogue entry for a class, or the generic unknown entry
    fn disease_info(&self, name: &str) -> DiseaseInfo {
        match self.catalog.get(name) {
            Some(info) => info.clone(),
            None => {
                let err = PredictorError::UnknownClassLabel(name.to_string());
                tracing::warn!(error = %err, "Substituting unknown disease entry");
                DiseaseInfo::unknown()
            }
        }
    }

    /// Up to `top_k` diseases, most confident first
    pub fn predict(
        &self,
        image: &ImageInput,
        top_k: usize,
    ) -> PredictorResult<Vec<DiseasePrediction>> {
        let names = self.classifier.class_names();
        let scores = self.classifier.class_scores(image)?;

        if scores.len() != names.len() {
            return Err(PredictorError::Detection(format!(
                "Classifier returned {} scores for {} classes",
                scores.len(),
                names.len()
            )));
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(PredictorError::Detection(
                "Classifier returned non-finite scores".to_string(),
            ));
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

        let predictions = order
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(i, idx)| {
                let name = &names[idx];
                let info = self.disease_info(name);
                DiseasePrediction {
                    rank: i + 1,
                    disease_name: name.clone(),
                    confidence: scores[idx].clamp(0.0, 1.0),
                    description: info.description,
                    treatment: info.treatment,
                    severity: info.severity,
                }
            })
            .collect();

        Ok(predictions)
    }

    /// Treatment plan for the most likely disease; `None` if the classifier has no classes
    pub fn treatment_report(&self, image: &ImageInput) -> PredictorResult<Option<TreatmentReport>> {
        let predictions = self.predict(image, 1)?;
        Ok(predictions.first().map(TreatmentReport::from_primary))
    }
}

// ============================================================================
// Remote classifier
// ============================================================================

/// Request to classify a leaf image
#[derive(Debug, Serialize)]
pub struct ClassifyImageRequest {
    pub image_base64: String,
}

/// Response from the inference endpoint
#[derive(Debug, Deserialize)]
pub struct ClassifyImageResponse {
    #[serde(default)]
    pub request_id: Option<String>,
    /// One score per class, in the classifier's class order
    pub scores: Vec<f64>,
}

/// Client for a hosted leaf classification service
#[derive(Clone)]
pub struct RemoteImageClassifier {
    api_endpoint: String,
    api_key: String,
    class_names: Vec<String>,
    http_client: Client,
}

impl RemoteImageClassifier {
    pub fn new(
        api_endpoint: String,
        api_key: String,
        class_names: Vec<String>,
        timeout: Duration,
    ) -> PredictorResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PredictorError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            api_endpoint,
            api_key,
            class_names,
            http_client,
        })
    }

    /// Build from configuration; `None` when no endpoint or key is configured
    pub fn from_config(config: &DetectorConfig) -> PredictorResult<Option<Self>> {
        let (Some(endpoint), Some(api_key)) = (&config.endpoint, &config.api_key) else {
            return Ok(None);
        };
        let class_names = DEFAULT_CLASS_NAMES.iter().map(|c| c.to_string()).collect();
        Self::new(
            endpoint.clone(),
            api_key.clone(),
            class_names,
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }

    fn classify(&self, request: &ClassifyImageRequest) -> PredictorResult<ClassifyImageResponse> {
        let response = self
            .http_client
            .post(&self.api_endpoint)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .map_err(|e| PredictorError::Detection(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PredictorError::Detection(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .map_err(|e| PredictorError::Detection(format!("Failed to parse response: {}", e)))
    }
}

impl ImageClassifier for RemoteImageClassifier {
    fn class_names(&self) -> &[String] {
        &self.class_names
    }

    fn class_scores(&self, image: &ImageInput) -> PredictorResult<Vec<f64>> {
        let request = ClassifyImageRequest {
            image_base64: STANDARD.encode(image.bytes()?),
        };
        let response = self.classify(&request)?;
        tracing::debug!(request_id = ?response.request_id, "Leaf image classified");
        Ok(response.scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Severity, SpreadRisk};

    struct FixedScores {
        names: Vec<String>,
        scores: Vec<f64>,
    }

    impl FixedScores {
        fn new(names: &[&str], scores: &[f64]) -> Self {
            Self {
                names: names.iter().map(|n| n.to_string()).collect(),
                scores: scores.to_vec(),
            }
        }
    }

    impl ImageClassifier for FixedScores {
        fn class_names(&self) -> &[String] {
            &self.names
        }

        fn class_scores(&self, _image: &ImageInput) -> PredictorResult<Vec<f64>> {
            Ok(self.scores.clone())
        }
    }

    fn image() -> ImageInput {
        ImageInput::Bytes(vec![0u8; 4])
    }

    #[test]
    fn ranks_by_confidence() {
        let classifier = FixedScores::new(&DEFAULT_CLASS_NAMES, &[0.05, 0.1, 0.7, 0.05, 0.06, 0.04]);
        let detector = PlantDiseaseDetector::new(classifier);
        let predictions = detector.predict(&image(), 3).unwrap();

        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].rank, 1);
        assert_eq!(predictions[0].disease_name, "late_blight");
        assert_eq!(predictions[0].severity, Severity::High);
        assert_eq!(predictions[1].disease_name, "early_blight");
        assert_eq!(predictions[2].disease_name, "mosaic_virus");
    }

    #[test]
    fn unknown_class_gets_default_entry() {
        let classifier = FixedScores::new(&["rust_fungus", "healthy"], &[0.9, 0.1]);
        let detector = PlantDiseaseDetector::new(classifier);
        let top = &detector.predict(&image(), 1).unwrap()[0];
        assert_eq!(top.disease_name, "rust_fungus");
        assert_eq!(top.description, "Unknown disease");
        assert_eq!(top.treatment, vec!["Consult agricultural expert"]);
        assert_eq!(top.severity, Severity::Unknown);
    }

    #[test]
    fn report_uses_primary_detection() {
        let classifier = FixedScores::new(&["healthy", "leaf_mold"], &[0.15, 0.85]);
        let detector = PlantDiseaseDetector::new(classifier);
        let report = detector.treatment_report(&image()).unwrap().unwrap();
        assert_eq!(report.image_analysis.detected_disease, "leaf_mold");
        assert_eq!(report.risk_assessment.spread_risk, SpreadRisk::High);
        assert_eq!(report.risk_assessment.crop_loss_potential, Severity::Low);
        assert_eq!(report.prevention_measures.len(), 5);
        assert_eq!(report.follow_up.len(), 4);
    }

    #[test]
    fn mismatched_scores_fail() {
        let classifier = FixedScores::new(&["healthy", "leaf_mold"], &[1.0]);
        let detector = PlantDiseaseDetector::new(classifier);
        assert!(matches!(
            detector.predict(&image(), 3),
            Err(PredictorError::Detection(_))
        ));
    }

    #[test]
    fn empty_classifier_has_no_report() {
        let detector = PlantDiseaseDetector::new(FixedScores::new(&[], &[]));
        assert!(detector.treatment_report(&image()).unwrap().is_none());
    }

    #[test]
    fn remote_classifier_needs_endpoint_and_key() {
        let config = DetectorConfig::default();
        assert!(RemoteImageClassifier::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn missing_image_file_is_a_detection_error() {
        let input = ImageInput::Path(PathBuf::from("/nonexistent/leaf.jpg"));
        assert!(matches!(input.bytes(), Err(PredictorError::Detection(_))));
    }
}
