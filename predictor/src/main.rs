//! AgriSense training run
//!
//! Generates (or loads) crop records, trains both models, saves the fitted
//! pipeline and logs two example predictions.
//!
//! Usage: `agrisense-train [observations.csv]`

use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agrisense_predictor::external::{ImageInput, PlantDiseaseDetector, RemoteImageClassifier};
use agrisense_predictor::services::{assess_soil_health, read_csv, summarize};
use agrisense_predictor::{
    Config, CropPredictor, PredictorError, PredictorResult, SyntheticDataGenerator,
};
use shared::{EnvironmentalConditions, Observation};

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "agrisense_predictor=info,agrisense_train=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
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

fn example_conditions() -> EnvironmentalConditions {
    EnvironmentalConditions {
        humidity: 85.0,
        temperature: 28.0,
        rainfall: 120.0,
        soil_ph: 6.0,
        soil_moisture: Some(80.0),
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    init_tracing(config.environment == "production");

    tracing::info!("Starting AgriSense training run");
    tracing::info!("Environment: {}", config.environment);

    if let Err(err) = run(&config) {
        let detail = err.detail();
        tracing::error!(code = %detail.code, "Training run failed: {}", detail.message);
        return Err(err.into());
    }

    Ok(())
}

fn run(config: &Config) -> PredictorResult<()> {
    let observations = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => read_csv(&path)?,
        None => {
            tracing::info!(
                samples = config.generator.samples,
                seed = config.generator.seed,
                "Generating sample Kenyan crop data"
            );
            SyntheticDataGenerator::new(config.generator.clone()).generate_default()?
        }
    };

    let summary = summarize(&observations);
    tracing::info!("Generated {} crop records", summary.records);
    tracing::info!("Crops: {}", summary.crops.join(", "));
    tracing::info!("Regions: {}", summary.regions.join(", "));
    for (region, mean_yield) in &summary.mean_yield_by_region {
        tracing::info!(region = %region, mean_yield, "Mean yield by region");
    }

    let soil = assess_soil_health(&observations)?;
    tracing::info!(
        average_ph = soil.average_ph,
        nitrogen = ?soil.nutrient_status.nitrogen,
        phosphorus = ?soil.nutrient_status.phosphorus,
        potassium = ?soil.nutrient_status.potassium,
        "Soil health"
    );
    for recommendation in &soil.recommendations {
        tracing::info!("Soil recommendation: {}", recommendation);
    }

    let mut predictor = CropPredictor::from_config(config);
    let report = predictor.train(&observations)?;
    tracing::info!(
        train_r2 = report.yield_model.train_r2,
        test_r2 = report.yield_model.test_r2,
        train_accuracy = report.disease_model.train_accuracy,
        test_accuracy = report.disease_model.test_accuracy,
        "Training summary"
    );

    predictor.save(&config.persistence.model_path)?;

    let yield_prediction = predictor.predict_yield(&example_crop())?;
    tracing::info!(
        "Predicted Yield: {:.2} tons/hectare (confidence {:.2})",
        yield_prediction.predicted_yield,
        yield_prediction.confidence
    );

    let risk = predictor.predict_disease_risk(&example_conditions())?;
    tracing::info!(
        "Disease Risk Level: {} (confidence {:.2})",
        risk.risk_level,
        risk.confidence
    );
    for (level, probability) in &risk.probabilities {
        tracing::info!("  {}: {:.2}", level, probability);
    }

    // Leaf image analysis only runs when a classifier endpoint is configured
    if let (Some(classifier), Ok(image)) = (
        RemoteImageClassifier::from_config(&config.detector)?,
        std::env::var("AGRISENSE_LEAF_IMAGE"),
    ) {
        let detector = PlantDiseaseDetector::new(classifier);
        let image = ImageInput::Path(PathBuf::from(image));
        for prediction in detector.predict(&image, config.detector.top_k)? {
            tracing::info!(
                rank = prediction.rank,
                disease = %prediction.disease_name,
                confidence = prediction.confidence,
                "Leaf disease detection"
            );
        }
        if let Some(report) = detector.treatment_report(&image)? {
            let report = serde_json::to_string_pretty(&report)
                .map_err(|e| PredictorError::Detection(e.to_string()))?;
            tracing::info!("Treatment report: {}", report);
        }
    }

    Ok(())
}
