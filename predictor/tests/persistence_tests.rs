//! Tests for saving and loading the fitted pipeline
//! Verifies exact round-trips and rejection of incomplete or tampered artifacts

use std::fs;

use agrisense_predictor::config::{FeatureConfig, TrainingConfig};
use agrisense_predictor::services::dataset::{read_observations, write_observations};
use agrisense_predictor::{CropPredictor, PredictorError, SyntheticDataGenerator, TrainingState};
use shared::{EnvironmentalConditions, Observation};
use tempfile::TempDir;

fn new_predictor() -> CropPredictor {
    CropPredictor::new(
        FeatureConfig::default(),
        TrainingConfig {
            n_estimators: 8,
            ..TrainingConfig::default()
        },
    )
}

fn trained_predictor() -> CropPredictor {
    let data = SyntheticDataGenerator::default().generate(150, 42).unwrap();
    let mut p = new_predictor();
    p.train(&data).unwrap();
    p
}

fn fixture_records() -> Vec<Observation> {
    SyntheticDataGenerator::default().generate(20, 99).unwrap()
}

fn conditions() -> EnvironmentalConditions {
    EnvironmentalConditions {
        humidity: 85.0,
        temperature: 28.0,
        rainfall: 120.0,
        soil_ph: 6.0,
        soil_moisture: Some(80.0),
    }
}

// ============================================================================
// Round Trip
// ============================================================================

mod round_trip {
    use super::*;

    #[test]
    fn loaded_pipeline_predicts_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");

        let original = trained_predictor();
        original.save(&path).unwrap();

        let mut restored = new_predictor();
        restored.load(&path).unwrap();

        assert_eq!(restored.state(), TrainingState::FullyTrained);
        assert_eq!(restored.to_artifact(), original.to_artifact());
        for obs in fixture_records() {
            assert_eq!(
                restored.predict_yield(&obs).unwrap(),
                original.predict_yield(&obs).unwrap()
            );
        }
        assert_eq!(
            restored.predict_disease_risk(&conditions()).unwrap(),
            original.predict_disease_risk(&conditions()).unwrap()
        );
    }

    #[test]
    fn load_overwrites_in_memory_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("untrained.json");
        new_predictor().save(&path).unwrap();

        let mut p = trained_predictor();
        p.load(&path).unwrap();
        assert_eq!(p.state(), TrainingState::Untrained);
        assert!(matches!(
            p.predict_disease_risk(&conditions()),
            Err(PredictorError::NotTrained { .. })
        ));
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        trained_predictor().save(&path).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["model.json"]);
    }
}

// ============================================================================
// Rejected Artifacts
// ============================================================================

mod rejected_artifacts {
    use super::*;

    fn saved_json(dir: &TempDir) -> serde_json::Value {
        let path = dir.path().join("model.json");
        trained_predictor().save(&path).unwrap();
        serde_json::from_slice(&fs::read(&path).unwrap()).unwrap()
    }

    fn load_value(dir: &TempDir, value: &serde_json::Value) -> Result<(), PredictorError> {
        let path = dir.path().join("edited.json");
        fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
        new_predictor().load(&path)
    }

    #[test]
    fn missing_file() {
        let dir = TempDir::new().unwrap();
        let err = new_predictor().load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PredictorError::Persistence(_)));
    }

    #[test]
    fn not_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, b"not json at all").unwrap();
        assert!(matches!(
            new_predictor().load(&path),
            Err(PredictorError::Persistence(_))
        ));
    }

    #[test]
    fn each_missing_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let value = saved_json(&dir);

        for key in ["scaler", "yield_model", "disease_model", "is_fitted"] {
            let mut edited = value.clone();
            edited.as_object_mut().unwrap().remove(key);
            match load_value(&dir, &edited) {
                Err(PredictorError::Persistence(msg)) => assert!(msg.contains(key), "{msg}"),
                other => panic!("expected persistence error for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn tampered_contents_fail_checksum() {
        let dir = TempDir::new().unwrap();
        let mut value = saved_json(&dir);
        value["is_fitted"] = serde_json::Value::Bool(false);
        let err = load_value(&dir, &value).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut value = saved_json(&dir);
        value["format_version"] = serde_json::json!(99);
        assert!(matches!(
            load_value(&dir, &value),
            Err(PredictorError::Persistence(_))
        ));
    }

    #[test]
    fn failed_load_keeps_current_pipeline() {
        let dir = TempDir::new().unwrap();
        let mut p = trained_predictor();
        assert!(p.load(dir.path().join("absent.json")).is_err());
        assert_eq!(p.state(), TrainingState::FullyTrained);
        assert!(p.predict_disease_risk(&conditions()).is_ok());
    }
}

// ============================================================================
// Dataset CSV
// ============================================================================

mod dataset_csv {
    use super::*;

    #[test]
    fn generated_records_survive_csv() {
        let records = SyntheticDataGenerator::default().generate(40, 8).unwrap();
        let mut buffer = Vec::new();
        write_observations(&mut buffer, &records).unwrap();

        let restored = read_observations(buffer.as_slice()).unwrap();
        assert_eq!(restored.len(), records.len());
        for (a, b) in records.iter().zip(&restored) {
            assert_eq!(a.crop_id, b.crop_id);
            assert_eq!(a.diseases, b.diseases);
            assert_eq!(a.pesticides, b.pesticides);
            assert_eq!(a.planting_date, b.planting_date);
            assert!((a.yield_tons_per_hectare - b.yield_tons_per_hectare).abs() < 1e-9);
        }
    }
}
