//! Configuration management for the AgriSense prediction engine
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with AGRISENSE_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

pub use shared::GrowthPeriodPolicy;

/// Main engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Synthetic data generation
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Feature extraction
    #[serde(default)]
    pub features: FeatureConfig,

    /// Model training
    #[serde(default)]
    pub training: TrainingConfig,

    /// Leaf image detector
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Model artifact storage
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

fn default_environment() -> String {
    "development".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            generator: GeneratorConfig::default(),
            features: FeatureConfig::default(),
            training: TrainingConfig::default(),
            detector: DetectorConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of records to generate
    pub samples: usize,

    /// Seed for the generator RNG
    pub seed: u64,

    /// Year all planting dates fall in
    pub reference_year: i32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            seed: 42,
            reference_year: 2024,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeatureConfig {
    /// Soil moisture (%) used when a record carries no sensor reading
    pub default_soil_moisture: f64,

    /// Reject or clamp records whose harvest precedes planting
    pub growth_period_policy: GrowthPeriodPolicy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            default_soil_moisture: 50.0,
            growth_period_policy: GrowthPeriodPolicy::Reject,
        }
    }
}

/// Which training state unlocks inference
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessPolicy {
    /// Both models must be trained before either serves predictions
    #[default]
    AllOrNothing,
    /// Each model serves predictions as soon as it is trained
    PerCapability,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of records held out for evaluation
    pub test_fraction: f64,

    /// Seed for the train/test shuffles
    pub split_seed: u64,

    /// Trees in the yield forest
    pub n_estimators: usize,

    /// Maximum tree depth (unlimited when absent)
    pub max_depth: Option<usize>,

    /// Minimum samples a node needs before it may split
    pub min_samples_split: usize,

    /// Seed for bootstrap sampling
    pub forest_seed: u64,

    pub readiness: ReadinessPolicy,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            split_seed: 42,
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            forest_seed: 42,
            readiness: ReadinessPolicy::AllOrNothing,
        }
    }
}

impl TrainingConfig {
    /// Reject hyper-parameters no model can train with
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err("Test fraction must be between 0.0 and 1.0 (exclusive)");
        }
        if self.n_estimators == 0 {
            return Err("Forest needs at least one estimator");
        }
        if self.min_samples_split < 2 {
            return Err("min_samples_split must be at least 2");
        }
        if self.max_depth == Some(0) {
            return Err("max_depth must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of ranked diseases returned per image
    pub top_k: usize,

    /// Remote leaf classifier endpoint
    pub endpoint: Option<String>,

    /// Remote leaf classifier API key
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            endpoint: None,
            api_key: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Where the fitted pipeline is written
    pub model_path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            model_path: "agrisense_model.json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("AGRISENSE_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("generator.samples", 1000)?
            .set_default("generator.seed", 42)?
            .set_default("generator.reference_year", 2024)?
            .set_default("features.default_soil_moisture", 50.0)?
            .set_default("features.growth_period_policy", "reject")?
            .set_default("training.test_fraction", 0.2)?
            .set_default("training.split_seed", 42)?
            .set_default("training.n_estimators", 100)?
            .set_default("training.min_samples_split", 2)?
            .set_default("training.forest_seed", 42)?
            .set_default("training.readiness", "all_or_nothing")?
            .set_default("detector.top_k", 3)?
            .set_default("detector.timeout_secs", 60)?
            .set_default("persistence.model_path", "agrisense_model.json")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AGRISENSE_ prefix)
            .add_source(
                Environment::with_prefix("AGRISENSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.generator.samples, 1000);
        assert_eq!(config.generator.seed, 42);
        assert_eq!(config.features.default_soil_moisture, 50.0);
        assert_eq!(config.features.growth_period_policy, GrowthPeriodPolicy::Reject);
        assert_eq!(config.training.n_estimators, 100);
        assert_eq!(config.training.readiness, ReadinessPolicy::AllOrNothing);
        assert_eq!(config.detector.top_k, 3);
        assert!(config.training.validate().is_ok());
    }

    #[test]
    fn training_validation_rejects_degenerate_settings() {
        let mut training = TrainingConfig::default();
        training.test_fraction = 1.0;
        assert!(training.validate().is_err());

        let mut training = TrainingConfig::default();
        training.n_estimators = 0;
        assert!(training.validate().is_err());

        let mut training = TrainingConfig::default();
        training.min_samples_split = 1;
        assert!(training.validate().is_err());
    }

    #[test]
    fn policies_deserialize_from_snake_case() {
        let policy: ReadinessPolicy = serde_json::from_str("\"per_capability\"").unwrap();
        assert_eq!(policy, ReadinessPolicy::PerCapability);
        let policy: GrowthPeriodPolicy = serde_json::from_str("\"clamp\"").unwrap();
        assert_eq!(policy, GrowthPeriodPolicy::Clamp);
    }
}
