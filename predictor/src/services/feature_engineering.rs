//! Feature extraction for the yield and disease risk models

use ndarray::Array2;

use crate::config::{FeatureConfig, GrowthPeriodPolicy};
use crate::error::{PredictorError, PredictorResult};
use shared::{
    DiseaseFeatures, EnvironmentalConditions, FeatureError, Observation, YieldFeatures,
    DISEASE_FEATURE_COUNT, YIELD_FEATURE_COUNT,
};

/// Turns raw observations into fixed-order numeric feature vectors
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Yield features for a batch, one row per observation
    ///
    /// The first malformed record aborts the whole batch.
    pub fn extract(&self, observations: &[Observation]) -> PredictorResult<Array2<f64>> {
        let mut matrix = Array2::zeros((observations.len(), YIELD_FEATURE_COUNT));
        for (mut row, obs) in matrix.rows_mut().into_iter().zip(observations) {
            let features = self.extract_one(obs)?.to_array();
            row.iter_mut().zip(features).for_each(|(cell, v)| *cell = v);
        }
        Ok(matrix)
    }

    /// Yield features for one observation
    ///
    /// A harvest date before the planting date is rejected or clamped per
    /// the configured growth-period policy.
    pub fn extract_one(&self, obs: &Observation) -> PredictorResult<YieldFeatures> {
        let malformed = |e: FeatureError| PredictorError::malformed(&obs.crop_id, e.to_string());
        let features = YieldFeatures::from_observation(obs).map_err(malformed)?;

        let policy = self.config.growth_period_policy;
        if features.growth_period < 0 && policy == GrowthPeriodPolicy::Clamp {
            tracing::warn!(
                record_id = %obs.crop_id,
                growth_period = features.growth_period,
                "Harvest precedes planting; clamping growth period to 0"
            );
        }
        features.with_growth_policy(policy).map_err(malformed)
    }

    /// Disease features for one reading; absent soil moisture takes the configured default
    pub fn disease_features(&self, env: &EnvironmentalConditions) -> DiseaseFeatures {
        DiseaseFeatures {
            humidity: env.humidity,
            temperature: env.temperature,
            rainfall: env.rainfall,
            soil_ph: env.soil_ph,
            soil_moisture: env.soil_moisture.unwrap_or(self.config.default_soil_moisture),
        }
    }

    /// Disease features for a batch, one row per observation
    pub fn disease_matrix(&self, observations: &[Observation]) -> PredictorResult<Array2<f64>> {
        let mut matrix = Array2::zeros((observations.len(), DISEASE_FEATURE_COUNT));
        for (mut row, obs) in matrix.rows_mut().into_iter().zip(observations) {
            let features = self.disease_features(&obs.environment()).to_array();
            if features.iter().any(|v| !v.is_finite()) {
                return Err(PredictorError::malformed(
                    &obs.crop_id,
                    "environmental readings must be finite numbers",
                ));
            }
            row.iter_mut().zip(features).for_each(|(cell, v)| *cell = v);
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(planting: &str, harvest: &str) -> Observation {
        Observation {
            crop_id: "example".to_string(),
            crop_name: "Maize".to_string(),
            region: "Central".to_string(),
            planting_date: planting.to_string(),
            harvest_date: harvest.to_string(),
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

    #[test]
    fn derives_temporal_features() {
        let engineer = FeatureEngineer::default();
        let features = engineer
            .extract_one(&observation("2024-03-15", "2024-08-15"))
            .unwrap();
        assert_eq!(features.planting_month, 3);
        // 2024 is a leap year: 31 + 29 + 15
        assert_eq!(features.planting_day_of_year, 75);
        assert_eq!(features.growth_period, 153);
        assert_eq!(features.pesticide_count, 1);
        assert_eq!(features.disease_count, 0);
    }

    #[test]
    fn bad_date_is_malformed() {
        let engineer = FeatureEngineer::default();
        let err = engineer
            .extract(&[observation("2024-13-45", "2024-08-15")])
            .unwrap_err();
        assert!(matches!(err, PredictorError::MalformedRecord { .. }));
    }

    #[test]
    fn negative_growth_period_follows_policy() {
        let obs = observation("2024-08-15", "2024-03-15");

        let reject = FeatureEngineer::default();
        assert!(matches!(
            reject.extract_one(&obs),
            Err(PredictorError::MalformedRecord { .. })
        ));

        let clamp = FeatureEngineer::new(FeatureConfig {
            growth_period_policy: GrowthPeriodPolicy::Clamp,
            ..FeatureConfig::default()
        });
        assert_eq!(clamp.extract_one(&obs).unwrap().growth_period, 0);
    }

    #[test]
    fn rejection_reports_record_and_gap() {
        let err = FeatureEngineer::default()
            .extract_one(&observation("2024-08-15", "2024-03-15"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed record example: harvest date precedes planting date by 153 days"
        );
    }

    #[test]
    fn missing_moisture_uses_configured_default() {
        let engineer = FeatureEngineer::new(FeatureConfig {
            default_soil_moisture: 35.0,
            ..FeatureConfig::default()
        });
        let env = observation("2024-03-15", "2024-08-15").environment();
        assert_eq!(engineer.disease_features(&env).soil_moisture, 35.0);
    }
}
