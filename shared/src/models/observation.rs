//! Crop growth observation models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RiskLevel;
use crate::types::parse_record_date;

/// One crop-growth record: weather, soil and outcome for a single planting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub crop_id: String,
    pub crop_name: String,
    pub region: String,
    /// Planting date as recorded (ISO `YYYY-MM-DD`)
    pub planting_date: String,
    /// Harvest date as recorded (ISO `YYYY-MM-DD`)
    pub harvest_date: String,
    /// Yield in tons per hectare
    #[serde(rename = "yield")]
    pub yield_tons_per_hectare: f64,
    /// Seasonal rainfall in mm
    pub rainfall: f64,
    /// Mean temperature in °C
    pub temperature: f64,
    /// Relative humidity (0-100)
    pub humidity: f64,
    pub soil_ph: f64,
    pub soil_nitrogen: f64,
    pub soil_phosphorus: f64,
    pub soil_potassium: f64,
    /// Soil moisture (%), when a sensor reading exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_moisture: Option<f64>,
    /// Diseases observed during the growth cycle
    #[serde(default)]
    pub diseases: Vec<String>,
    /// Pesticides applied during the growth cycle
    #[serde(default)]
    pub pesticides: Vec<String>,
}

impl Observation {
    pub fn parsed_planting_date(&self) -> Result<NaiveDate, chrono::ParseError> {
        parse_record_date(&self.planting_date)
    }

    pub fn parsed_harvest_date(&self) -> Result<NaiveDate, chrono::ParseError> {
        parse_record_date(&self.harvest_date)
    }

    /// Rainfall, temperature, soil pH, humidity and the three soil nutrients
    pub fn measurements(&self) -> [f64; 7] {
        [
            self.rainfall,
            self.temperature,
            self.soil_ph,
            self.humidity,
            self.soil_nitrogen,
            self.soil_phosphorus,
            self.soil_potassium,
        ]
    }

    pub fn disease_count(&self) -> usize {
        self.diseases.len()
    }

    pub fn pesticide_count(&self) -> usize {
        self.pesticides.len()
    }

    /// Disease risk label derived from the number of observed diseases
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_disease_count(self.disease_count())
    }

    /// Environmental conditions relevant to disease risk
    pub fn environment(&self) -> EnvironmentalConditions {
        EnvironmentalConditions {
            humidity: self.humidity,
            temperature: self.temperature,
            rainfall: self.rainfall,
            soil_ph: self.soil_ph,
            soil_moisture: self.soil_moisture,
        }
    }
}

/// Environmental reading used by the disease risk model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentalConditions {
    pub humidity: f64,
    pub temperature: f64,
    pub rainfall: f64,
    pub soil_ph: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_moisture: Option<f64>,
}
