//! Validation utilities for AgriSense records
//!
//! Includes Kenya-specific crop and region reference sets.

use crate::models::Observation;

// ============================================================================
// Measurement Validations
// ============================================================================

/// Validate relative humidity is a percentage
pub fn validate_humidity(humidity: f64) -> Result<(), &'static str> {
    if !humidity.is_finite() || !(0.0..=100.0).contains(&humidity) {
        return Err("Humidity must be between 0 and 100%");
    }
    Ok(())
}

/// Validate soil pH is in the agronomic range (4-9)
pub fn validate_soil_ph(ph: f64) -> Result<(), &'static str> {
    if !ph.is_finite() || !(4.0..=9.0).contains(&ph) {
        return Err("Soil pH must be between 4 and 9");
    }
    Ok(())
}

/// Validate a quantity that cannot be negative (rainfall, nutrients, yield)
pub fn validate_non_negative(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() || value < 0.0 {
        return Err("Value must be a non-negative number");
    }
    Ok(())
}

/// Validate temperature is a finite reading
pub fn validate_temperature(celsius: f64) -> Result<(), &'static str> {
    if !celsius.is_finite() || !(-60.0..=70.0).contains(&celsius) {
        return Err("Temperature must be between -60 and 70 °C");
    }
    Ok(())
}

/// Validate every measured field of an observation
pub fn validate_observation(obs: &Observation) -> Result<(), &'static str> {
    if obs.crop_id.trim().is_empty() {
        return Err("Observation must have an identifier");
    }
    validate_non_negative(obs.yield_tons_per_hectare).map_err(|_| "Yield cannot be negative")?;
    validate_non_negative(obs.rainfall).map_err(|_| "Rainfall cannot be negative")?;
    validate_temperature(obs.temperature)?;
    validate_humidity(obs.humidity)?;
    validate_soil_ph(obs.soil_ph)?;
    validate_non_negative(obs.soil_nitrogen).map_err(|_| "Soil nitrogen cannot be negative")?;
    validate_non_negative(obs.soil_phosphorus)
        .map_err(|_| "Soil phosphorus cannot be negative")?;
    validate_non_negative(obs.soil_potassium).map_err(|_| "Soil potassium cannot be negative")?;
    if let Some(moisture) = obs.soil_moisture {
        if !moisture.is_finite() || !(0.0..=100.0).contains(&moisture) {
            return Err("Soil moisture must be between 0 and 100%");
        }
    }
    Ok(())
}

// ============================================================================
// Kenya-Specific Reference Sets
// ============================================================================

/// Crops covered by the bundled yield baselines
pub const KENYAN_CROPS: [&str; 7] = [
    "Maize", "Coffee", "Tea", "Beans", "Potatoes", "Tomatoes", "Cassava",
];

/// Former provinces used as growing regions
pub const KENYAN_REGIONS: [&str; 7] = [
    "Central",
    "Eastern",
    "Western",
    "Rift Valley",
    "Coast",
    "Northern",
    "Nyanza",
];

/// Validate crop is one of the supported crops (case-insensitive)
pub fn validate_crop_name(crop: &str) -> Result<(), &'static str> {
    if KENYAN_CROPS.iter().any(|c| c.eq_ignore_ascii_case(crop.trim())) {
        Ok(())
    } else {
        Err("Crop is not a supported Kenyan crop")
    }
}

/// Validate region is a known growing region (case-insensitive)
pub fn validate_region(region: &str) -> Result<(), &'static str> {
    if KENYAN_REGIONS.iter().any(|r| r.eq_ignore_ascii_case(region.trim())) {
        Ok(())
    } else {
        Err("Region is not a recognized Kenyan growing region")
    }
}
