//! Leaf-image disease detection models and treatment reports

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// Reference information about one disease class
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseInfo {
    pub description: String,
    pub treatment: Vec<String>,
    pub severity: Severity,
}

impl DiseaseInfo {
    pub fn new(description: &str, treatment: &[&str], severity: Severity) -> Self {
        Self {
            description: description.to_string(),
            treatment: treatment.iter().map(|t| t.to_string()).collect(),
            severity,
        }
    }

    /// Entry used for class names missing from the catalogue
    pub fn unknown() -> Self {
        Self::new("Unknown disease", &["Consult agricultural expert"], Severity::Unknown)
    }
}

/// Default disease catalogue for the bundled leaf classifier classes
pub fn default_disease_catalog() -> HashMap<String, DiseaseInfo> {
    let entries = [
        (
            "healthy",
            DiseaseInfo::new(
                "Plant appears healthy with no visible disease symptoms",
                &[
                    "Continue regular care",
                    "Monitor for changes",
                    "Maintain good agricultural practices",
                ],
                Severity::None,
            ),
        ),
        (
            "early_blight",
            DiseaseInfo::new(
                "Fungal disease causing dark spots with concentric rings on leaves",
                &[
                    "Apply copper-based fungicide",
                    "Improve air circulation around plants",
                    "Remove affected leaves and dispose properly",
                    "Use drip irrigation to avoid leaf wetness",
                ],
                Severity::Moderate,
            ),
        ),
        (
            "late_blight",
            DiseaseInfo::new(
                "Serious fungal disease causing water-soaked lesions",
                &[
                    "Apply systemic fungicide immediately",
                    "Destroy infected plants if severely affected",
                    "Avoid overhead watering",
                    "Apply preventive copper sprays in high humidity",
                ],
                Severity::High,
            ),
        ),
        (
            "bacterial_spot",
            DiseaseInfo::new(
                "Bacterial infection causing small, dark spots on leaves and fruits",
                &[
                    "Apply copper-based bactericide",
                    "Remove infected plant debris",
                    "Improve drainage and air circulation",
                    "Use resistant varieties when possible",
                ],
                Severity::Moderate,
            ),
        ),
        (
            "mosaic_virus",
            DiseaseInfo::new(
                "Viral disease causing mottled, mosaic-like patterns on leaves",
                &[
                    "Remove and destroy infected plants",
                    "Control aphid vectors",
                    "Use virus-resistant varieties",
                    "Maintain good field hygiene",
                ],
                Severity::High,
            ),
        ),
        (
            "leaf_mold",
            DiseaseInfo::new(
                "Fungal disease causing yellow spots that turn brown",
                &[
                    "Improve ventilation in greenhouse",
                    "Apply fungicide spray",
                    "Reduce humidity levels",
                    "Space plants for better air circulation",
                ],
                Severity::Low,
            ),
        ),
    ];

    entries
        .into_iter()
        .map(|(name, info)| (name.to_string(), info))
        .collect()
}

/// One ranked entry of an image detection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseasePrediction {
    /// 1-based rank
    pub rank: usize,
    pub disease_name: String,
    /// 0.0-1.0
    pub confidence: f64,
    pub description: String,
    pub treatment: Vec<String>,
    pub severity: Severity,
}

/// How fast a detected disease is expected to spread
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpreadRisk {
    High,
    Medium,
}

impl SpreadRisk {
    /// Detections above this confidence are treated as fast-spreading
    pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > Self::HIGH_CONFIDENCE_THRESHOLD {
            SpreadRisk::High
        } else {
            SpreadRisk::Medium
        }
    }
}

pub const PREVENTION_MEASURES: [&str; 5] = [
    "Maintain proper plant spacing for air circulation",
    "Use drip irrigation instead of overhead watering",
    "Remove plant debris regularly",
    "Monitor plants weekly for early detection",
    "Apply preventive fungicides during high-risk periods",
];

pub const FOLLOW_UP_ACTIONS: [&str; 4] = [
    "Monitor treated plants for 1-2 weeks",
    "Reapply treatment if symptoms persist",
    "Consult local agricultural extension if no improvement",
    "Consider resistant varieties for next planting",
];

pub const OPTIMAL_TREATMENT_WINDOW: &str = "24-48 hours for best results";

/// Summary of the primary detection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageAnalysis {
    pub detected_disease: String,
    pub confidence: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub spread_risk: SpreadRisk,
    pub crop_loss_potential: Severity,
    pub optimal_treatment_window: String,
}

/// Field treatment plan for a detected disease
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentReport {
    pub image_analysis: ImageAnalysis,
    pub disease_description: String,
    pub immediate_actions: Vec<String>,
    pub prevention_measures: Vec<String>,
    pub follow_up: Vec<String>,
    pub risk_assessment: RiskAssessment,
}

impl TreatmentReport {
    /// Build the treatment plan for the top-ranked detection
    pub fn from_primary(primary: &DiseasePrediction) -> Self {
        Self {
            image_analysis: ImageAnalysis {
                detected_disease: primary.disease_name.clone(),
                confidence: primary.confidence,
                severity: primary.severity,
            },
            disease_description: primary.description.clone(),
            immediate_actions: primary.treatment.clone(),
            prevention_measures: PREVENTION_MEASURES.iter().map(|s| s.to_string()).collect(),
            follow_up: FOLLOW_UP_ACTIONS.iter().map(|s| s.to_string()).collect(),
            risk_assessment: RiskAssessment {
                spread_risk: SpreadRisk::from_confidence(primary.confidence),
                crop_loss_potential: primary.severity,
                optimal_treatment_window: OPTIMAL_TREATMENT_WINDOW.to_string(),
            },
        }
    }
}
