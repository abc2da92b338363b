//! Feature vector layouts for the tabular models
//!
//! Column order is part of the model contract: a model trained on one layout
//! silently mispredicts on another, so both the engine and the browser
//! bindings build vectors through these types only.

use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::Observation;

/// Number of columns in a yield feature vector
pub const YIELD_FEATURE_COUNT: usize = 12;

/// Yield feature column names, in vector order
pub const YIELD_FEATURE_NAMES: [&str; YIELD_FEATURE_COUNT] = [
    "rainfall",
    "temperature",
    "soil_ph",
    "humidity",
    "soil_nitrogen",
    "soil_phosphorus",
    "soil_potassium",
    "planting_month",
    "planting_day_of_year",
    "growth_period",
    "pesticide_count",
    "disease_count",
];

/// Number of columns in a disease feature vector
pub const DISEASE_FEATURE_COUNT: usize = 5;

/// Disease feature column names, in vector order
pub const DISEASE_FEATURE_NAMES: [&str; DISEASE_FEATURE_COUNT] =
    ["humidity", "temperature", "rainfall", "soil_ph", "soil_moisture"];

/// Numeric features derived from one observation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YieldFeatures {
    pub rainfall: f64,
    pub temperature: f64,
    pub soil_ph: f64,
    pub humidity: f64,
    pub soil_nitrogen: f64,
    pub soil_phosphorus: f64,
    pub soil_potassium: f64,
    /// 1-12
    pub planting_month: u32,
    /// 1-366
    pub planting_day_of_year: u32,
    /// Days between planting and harvest
    pub growth_period: i64,
    pub pesticide_count: usize,
    pub disease_count: usize,
}

impl YieldFeatures {
    /// Derive the yield features of one observation
    ///
    /// Dates must parse and the seven measurements must be finite. The
    /// growth period is the raw day count and is negative when harvest
    /// precedes planting; see [`YieldFeatures::with_growth_policy`].
    pub fn from_observation(obs: &Observation) -> Result<Self, FeatureError> {
        let planting = obs
            .parsed_planting_date()
            .map_err(|e| FeatureError::unparsable_date("planting", &obs.planting_date, e))?;
        let harvest = obs
            .parsed_harvest_date()
            .map_err(|e| FeatureError::unparsable_date("harvest", &obs.harvest_date, e))?;
        if obs.measurements().iter().any(|v| !v.is_finite()) {
            return Err(FeatureError::NonFiniteMeasurement);
        }

        Ok(YieldFeatures {
            rainfall: obs.rainfall,
            temperature: obs.temperature,
            soil_ph: obs.soil_ph,
            humidity: obs.humidity,
            soil_nitrogen: obs.soil_nitrogen,
            soil_phosphorus: obs.soil_phosphorus,
            soil_potassium: obs.soil_potassium,
            planting_month: planting.month(),
            planting_day_of_year: planting.ordinal(),
            growth_period: (harvest - planting).num_days(),
            pesticide_count: obs.pesticide_count(),
            disease_count: obs.disease_count(),
        })
    }

    /// Apply `policy` to a negative growth period
    pub fn with_growth_policy(mut self, policy: GrowthPeriodPolicy) -> Result<Self, FeatureError> {
        if self.growth_period < 0 {
            match policy {
                GrowthPeriodPolicy::Reject => {
                    return Err(FeatureError::HarvestBeforePlanting {
                        days: self.growth_period,
                    })
                }
                GrowthPeriodPolicy::Clamp => self.growth_period = 0,
            }
        }
        Ok(self)
    }

    pub fn to_array(&self) -> [f64; YIELD_FEATURE_COUNT] {
        [
            self.rainfall,
            self.temperature,
            self.soil_ph,
            self.humidity,
            self.soil_nitrogen,
            self.soil_phosphorus,
            self.soil_potassium,
            self.planting_month as f64,
            self.planting_day_of_year as f64,
            self.growth_period as f64,
            self.pesticide_count as f64,
            self.disease_count as f64,
        ]
    }
}

/// What to do with a record whose harvest date precedes its planting date
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPeriodPolicy {
    /// Refuse the record
    #[default]
    Reject,
    /// Use a growth period of 0 days
    Clamp,
}

/// Why an observation has no yield feature vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    UnparsableDate {
        field: &'static str,
        value: String,
        reason: String,
    },
    NonFiniteMeasurement,
    HarvestBeforePlanting {
        days: i64,
    },
}

impl FeatureError {
    fn unparsable_date(field: &'static str, value: &str, e: chrono::ParseError) -> Self {
        FeatureError::UnparsableDate {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }
    }
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureError::UnparsableDate {
                field,
                value,
                reason,
            } => write!(f, "unparsable {} date '{}': {}", field, value, reason),
            FeatureError::NonFiniteMeasurement => f.write_str("measurements must be finite numbers"),
            FeatureError::HarvestBeforePlanting { days } => write!(
                f,
                "harvest date precedes planting date by {} days",
                days.unsigned_abs()
            ),
        }
    }
}

impl std::error::Error for FeatureError {}

/// Environmental features for the disease risk model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DiseaseFeatures {
    pub humidity: f64,
    pub temperature: f64,
    pub rainfall: f64,
    pub soil_ph: f64,
    pub soil_moisture: f64,
}

impl DiseaseFeatures {
    pub fn to_array(&self) -> [f64; DISEASE_FEATURE_COUNT] {
        [
            self.humidity,
            self.temperature,
            self.rainfall,
            self.soil_ph,
            self.soil_moisture,
        ]
    }
}
