//! Tests for the yield model, disease risk model and predictor facade
//! Verifies training reports, readiness gating, confidence bounds and
//! probability distributions

use std::sync::OnceLock;

use agrisense_predictor::config::{FeatureConfig, ReadinessPolicy, TrainingConfig};
use agrisense_predictor::{CropPredictor, PredictorError, SyntheticDataGenerator, TrainingState};
use approx::assert_relative_eq;
use proptest::prelude::*;
use shared::{EnvironmentalConditions, Observation, RiskLevel, YIELD_FEATURE_COUNT};

fn fast_training() -> TrainingConfig {
    TrainingConfig {
        n_estimators: 10,
        ..TrainingConfig::default()
    }
}

fn records(n: usize) -> Vec<Observation> {
    SyntheticDataGenerator::default().generate(n, 42).unwrap()
}

fn predictor(readiness: ReadinessPolicy) -> CropPredictor {
    CropPredictor::new(
        FeatureConfig::default(),
        TrainingConfig {
            readiness,
            ..fast_training()
        },
    )
}

fn trained() -> &'static CropPredictor {
    static TRAINED: OnceLock<CropPredictor> = OnceLock::new();
    TRAINED.get_or_init(|| {
        let mut p = predictor(ReadinessPolicy::AllOrNothing);
        p.train(&records(300)).unwrap();
        p
    })
}

fn example_crop() -> Observation {
    Observation {
        crop_id: "example".to_string(),
        crop_name: "Maize".to_string(),
        region: "Central".to_string(),
        planting_date: "2024-03-15".to_string(),
        harvest_date: "2024-08-15".to_string(),
        yield_tons_per_hectare: 0.0,
        rainfall: 800.0,
        temperature: 25.0,
        humidity: 75.0,
        soil_ph: 6.2,
        soil_nitrogen: 25.0,
        soil_phosphorus: 20.0,
        soil_potassium: 150.0,
        soil_moisture: None,
        diseases: vec![],
        pesticides: vec!["Neem oil".to_string()],
    }
}

fn humid_conditions() -> EnvironmentalConditions {
    EnvironmentalConditions {
        humidity: 85.0,
        temperature: 28.0,
        rainfall: 120.0,
        soil_ph: 6.0,
        soil_moisture: Some(80.0),
    }
}

// ============================================================================
// Readiness
// ============================================================================

mod readiness {
    use super::*;

    #[test]
    fn untrained_predictor_raises_not_trained() {
        let p = predictor(ReadinessPolicy::AllOrNothing);
        assert_eq!(p.state(), TrainingState::Untrained);
        assert!(matches!(
            p.predict_yield(&example_crop()),
            Err(PredictorError::NotTrained { .. })
        ));
        assert!(matches!(
            p.predict_disease_risk(&humid_conditions()),
            Err(PredictorError::NotTrained { .. })
        ));
    }

    #[test]
    fn all_or_nothing_blocks_half_trained_predictor() {
        let mut p = predictor(ReadinessPolicy::AllOrNothing);
        p.train_yield(&records(120)).unwrap();
        assert_eq!(p.state(), TrainingState::YieldTrained);
        assert!(!p.is_fitted());
        assert!(matches!(
            p.predict_yield(&example_crop()),
            Err(PredictorError::NotTrained { .. })
        ));

        p.train_disease(&records(120)).unwrap();
        assert_eq!(p.state(), TrainingState::FullyTrained);
        assert!(p.predict_yield(&example_crop()).is_ok());
        assert!(p.predict_disease_risk(&humid_conditions()).is_ok());
    }

    #[test]
    fn per_capability_serves_each_trained_half() {
        let mut p = predictor(ReadinessPolicy::PerCapability);
        p.train_disease(&records(120)).unwrap();
        assert_eq!(p.state(), TrainingState::DiseaseTrained);
        assert!(p.predict_disease_risk(&humid_conditions()).is_ok());
        assert!(matches!(
            p.predict_yield(&example_crop()),
            Err(PredictorError::NotTrained { capability: "yield" })
        ));
    }

    #[test]
    fn failed_training_keeps_previous_models() {
        let mut p = predictor(ReadinessPolicy::AllOrNothing);
        p.train(&records(150)).unwrap();
        let before = p.predict_yield(&example_crop()).unwrap();

        // Three records, one per risk class: the yield split works but the
        // stratified split leaves no test rows
        let mut tiny = records(3);
        tiny[0].diseases = vec![];
        tiny[1].diseases = vec!["Root rot".to_string()];
        tiny[2].diseases = vec!["Root rot".to_string(), "Fungal infections".to_string()];

        assert!(p.train(&tiny).is_err());
        assert_eq!(p.state(), TrainingState::FullyTrained);
        assert_eq!(p.predict_yield(&example_crop()).unwrap(), before);
    }

    #[test]
    fn malformed_training_batch_is_rejected() {
        let mut data = records(50);
        data[10].planting_date = "15/03/2024".to_string();
        let mut p = predictor(ReadinessPolicy::AllOrNothing);
        assert!(matches!(
            p.train(&data),
            Err(PredictorError::MalformedRecord { .. })
        ));
        assert_eq!(p.state(), TrainingState::Untrained);
    }

    #[test]
    fn invalid_hyper_parameters_are_rejected() {
        let mut p = CropPredictor::new(
            FeatureConfig::default(),
            TrainingConfig {
                n_estimators: 0,
                ..TrainingConfig::default()
            },
        );
        assert!(matches!(
            p.train(&records(50)),
            Err(PredictorError::InvalidInput(_))
        ));
    }
}

// ============================================================================
// Yield Model
// ============================================================================

mod yield_model {
    use super::*;

    #[test]
    fn report_covers_all_features_ranked() {
        let mut p = predictor(ReadinessPolicy::AllOrNothing);
        let report = p.train(&records(200)).unwrap().yield_model;

        assert_eq!(report.train_samples, 160);
        assert_eq!(report.test_samples, 40);
        assert_eq!(report.feature_importance.len(), YIELD_FEATURE_COUNT);
        let total: f64 = report.feature_importance.iter().map(|f| f.importance).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        assert!(report
            .feature_importance
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));

        // Bagged trees fit their own training data closely
        assert!(report.train_r2 > 0.5, "train r2 {}", report.train_r2);
        assert!(report.test_r2 <= 1.0);
    }

    #[test]
    fn training_is_reproducible() {
        let data = records(120);
        let mut a = predictor(ReadinessPolicy::AllOrNothing);
        let mut b = predictor(ReadinessPolicy::AllOrNothing);
        assert_eq!(a.train(&data).unwrap(), b.train(&data).unwrap());
        assert_eq!(
            a.predict_yield(&example_crop()).unwrap(),
            b.predict_yield(&example_crop()).unwrap()
        );
    }

    #[test]
    fn example_prediction_is_plausible() {
        let prediction = trained().predict_yield(&example_crop()).unwrap();
        assert!(prediction.predicted_yield >= 0.0);
        assert!(prediction.predicted_yield <= 100.0);
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 0.99);
    }
}

// ============================================================================
// Disease Risk Model
// ============================================================================

mod disease_model {
    use super::*;

    #[test]
    fn report_counts_every_class() {
        let mut p = predictor(ReadinessPolicy::AllOrNothing);
        let data = records(300);
        let report = p.train(&data).unwrap().disease_model;

        assert_eq!(report.class_counts.len(), 3);
        assert_eq!(report.class_counts.values().sum::<usize>(), 300);
        assert_eq!(report.train_samples + report.test_samples, 300);
        assert!((0.0..=1.0).contains(&report.train_accuracy));
        assert!((0.0..=1.0).contains(&report.test_accuracy));
    }

    #[test]
    fn prediction_has_all_three_classes() {
        let prediction = trained().predict_disease_risk(&humid_conditions()).unwrap();
        assert_eq!(prediction.probabilities.len(), 3);
        for level in RiskLevel::ALL {
            assert!(prediction.probabilities.contains_key(level.as_str()));
        }
        let total: f64 = prediction.probabilities.values().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        assert_relative_eq!(
            prediction.confidence,
            prediction.probabilities[prediction.risk_level.as_str()]
        );
    }

    #[test]
    fn confidence_is_the_largest_probability() {
        let prediction = trained().predict_disease_risk(&humid_conditions()).unwrap();
        let max = prediction
            .probabilities
            .values()
            .cloned()
            .fold(f64::MIN, f64::max);
        assert_eq!(prediction.confidence, max);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Yield confidence stays within [0, 0.99] for any input
    #[test]
    fn yield_confidence_is_bounded(
        rainfall in 0.0f64..3000.0,
        temperature in 0.0f64..45.0,
        humidity in 0.0f64..100.0,
        soil_ph in 4.0f64..9.0,
        nitrogen in 0.0f64..80.0,
    ) {
        let mut obs = example_crop();
        obs.rainfall = rainfall;
        obs.temperature = temperature;
        obs.humidity = humidity;
        obs.soil_ph = soil_ph;
        obs.soil_nitrogen = nitrogen;

        let prediction = trained().predict_yield(&obs).unwrap();
        prop_assert!(prediction.confidence >= 0.0);
        prop_assert!(prediction.confidence <= 0.99);
        prop_assert!(prediction.predicted_yield.is_finite());
    }

    /// Risk probabilities form a distribution for any conditions
    #[test]
    fn risk_probabilities_sum_to_one(
        humidity in 0.0f64..100.0,
        temperature in 0.0f64..45.0,
        rainfall in 0.0f64..3000.0,
        soil_ph in 4.0f64..9.0,
        soil_moisture in proptest::option::of(0.0f64..100.0),
    ) {
        let env = EnvironmentalConditions { humidity, temperature, rainfall, soil_ph, soil_moisture };
        let prediction = trained().predict_disease_risk(&env).unwrap();
        let total: f64 = prediction.probabilities.values().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(prediction.probabilities.values().all(|p| (0.0..=1.0).contains(p)));
    }

    /// The risk label depends on the disease count alone
    #[test]
    fn risk_label_is_a_function_of_count(count in 0usize..20) {
        let expected = match count {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            _ => RiskLevel::High,
        };
        let mut obs = example_crop();
        obs.diseases = vec!["d".to_string(); count];
        prop_assert_eq!(obs.risk_level(), expected);
        prop_assert_eq!(RiskLevel::from_disease_count(count), expected);
    }
}
