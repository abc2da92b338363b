//! Tests for the leaf-image detector boundary
//! Verifies ranking, catalogue lookup with unknown-class fallback and the
//! treatment report layout

use std::collections::HashMap;

use agrisense_predictor::external::{ImageClassifier, ImageInput, PlantDiseaseDetector};
use agrisense_predictor::PredictorResult;
use shared::{DiseaseInfo, Severity, SpreadRisk, FOLLOW_UP_ACTIONS, PREVENTION_MEASURES};

/// Classifier that scores images by their first byte
struct ByteClassifier {
    names: Vec<String>,
}

impl ImageClassifier for ByteClassifier {
    fn class_names(&self) -> &[String] {
        &self.names
    }

    fn class_scores(&self, image: &ImageInput) -> PredictorResult<Vec<f64>> {
        let bytes = image.bytes()?;
        let hot = bytes.first().copied().unwrap_or(0) as usize % self.names.len();
        let n = self.names.len() as f64;
        Ok((0..self.names.len())
            .map(|i| if i == hot { 0.7 } else { 0.3 / (n - 1.0) })
            .collect())
    }
}

fn classifier(names: &[&str]) -> ByteClassifier {
    ByteClassifier {
        names: names.iter().map(|n| n.to_string()).collect(),
    }
}

// ============================================================================
// Ranking
// ============================================================================

mod ranking {
    use super::*;

    #[test]
    fn top_k_is_capped_by_class_count() {
        let detector = PlantDiseaseDetector::new(classifier(&["healthy", "early_blight"]));
        let predictions = detector.predict(&ImageInput::Bytes(vec![1]), 5).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].disease_name, "early_blight");
        assert_eq!(predictions[0].rank, 1);
        assert_eq!(predictions[1].rank, 2);
        assert!(predictions[0].confidence >= predictions[1].confidence);
    }

    #[test]
    fn zero_k_returns_nothing() {
        let detector = PlantDiseaseDetector::new(classifier(&["healthy"]));
        assert!(detector.predict(&ImageInput::Bytes(vec![0]), 0).unwrap().is_empty());
    }

    #[test]
    fn images_can_be_read_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("leaf.jpg");
        std::fs::write(&path, [2u8, 0, 0]).unwrap();

        let detector =
            PlantDiseaseDetector::new(classifier(&["healthy", "early_blight", "late_blight"]));
        let top = &detector.predict(&ImageInput::Path(path), 1).unwrap()[0];
        assert_eq!(top.disease_name, "late_blight");
        assert_eq!(top.severity, Severity::High);
    }
}

// ============================================================================
// Catalogue
// ============================================================================

mod catalogue {
    use super::*;

    #[test]
    fn custom_catalogue_is_used() {
        let mut catalog = HashMap::new();
        catalog.insert(
            "coffee_rust".to_string(),
            DiseaseInfo::new("Orange pustules on leaf undersides", &["Spray copper"], Severity::High),
        );
        let detector = PlantDiseaseDetector::with_catalog(classifier(&["coffee_rust"]), catalog);
        let top = &detector.predict(&ImageInput::Bytes(vec![0]), 1).unwrap()[0];
        assert_eq!(top.description, "Orange pustules on leaf undersides");
        assert_eq!(top.treatment, vec!["Spray copper"]);
    }

    #[test]
    fn unknown_class_is_recovered_not_raised() {
        let detector = PlantDiseaseDetector::new(classifier(&["cassava_mosaic", "healthy"]));
        let top = &detector.predict(&ImageInput::Bytes(vec![0]), 1).unwrap()[0];
        assert_eq!(top.disease_name, "cassava_mosaic");
        assert_eq!(top.description, "Unknown disease");
        assert_eq!(top.severity, Severity::Unknown);
    }
}

// ============================================================================
// Treatment Report
// ============================================================================

mod treatment_report {
    use super::*;

    #[test]
    fn report_layout() {
        let detector = PlantDiseaseDetector::new(classifier(&["healthy", "bacterial_spot"]));
        let report = detector
            .treatment_report(&ImageInput::Bytes(vec![1]))
            .unwrap()
            .unwrap();

        assert_eq!(report.image_analysis.detected_disease, "bacterial_spot");
        assert_eq!(report.image_analysis.severity, Severity::Moderate);
        assert_eq!(report.immediate_actions.len(), 4);
        assert_eq!(report.prevention_measures, PREVENTION_MEASURES.to_vec());
        assert_eq!(report.follow_up, FOLLOW_UP_ACTIONS.to_vec());
        // 0.7 is not above the high-risk threshold
        assert_eq!(report.risk_assessment.spread_risk, SpreadRisk::Medium);
        assert_eq!(report.risk_assessment.crop_loss_potential, Severity::Moderate);
        assert_eq!(
            report.risk_assessment.optimal_treatment_window,
            "24-48 hours for best results"
        );
    }
}
