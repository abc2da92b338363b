//! WebAssembly module for the AgriSense platform
//!
//! Provides client-side computation for:
//! - Record validation before upload
//! - Disease risk labels and feature vectors
//! - Growth period calculation
//! - Treatment reports for detections made in the browser

use shared::{
    format_record_date, parse_record_date, DiseaseFeatures, DiseasePrediction,
    EnvironmentalConditions, GrowthPeriodPolicy, TreatmentReport, YieldFeatures,
};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(message: String) -> JsValue {
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

// ============================================================================
// Validation
// ============================================================================

fn check_observation(record_json: &str) -> Result<(), String> {
    let obs: Observation =
        serde_json::from_str(record_json).map_err(|e| format!("Invalid record JSON: {}", e))?;
    validate_observation(&obs).map_err(str::to_string)?;
    parse_record_date(&obs.planting_date)
        .map_err(|e| format!("Invalid planting date '{}': {}", obs.planting_date, e))?;
    parse_record_date(&obs.harvest_date)
        .map_err(|e| format!("Invalid harvest date '{}': {}", obs.harvest_date, e))?;
    Ok(())
}

/// Validate an observation record before it is queued for upload
#[wasm_bindgen]
pub fn validate_observation_record(record_json: &str) -> Result<(), JsValue> {
    check_observation(record_json).map_err(js_error)
}

/// Check a crop name against the supported Kenyan crops
#[wasm_bindgen]
pub fn is_supported_crop(crop: &str) -> bool {
    validate_crop_name(crop).is_ok()
}

/// Check a region name against the supported Kenyan regions
#[wasm_bindgen]
pub fn is_supported_region(region: &str) -> bool {
    validate_region(region).is_ok()
}

// ============================================================================
// Features
// ============================================================================

/// Disease risk label ("Low Risk", "Medium Risk", "High Risk") for a disease count
#[wasm_bindgen]
pub fn risk_level_for_disease_count(count: u32) -> String {
    RiskLevel::from_disease_count(count as usize).as_str().to_string()
}

fn growth_period(planting: &str, harvest: &str) -> Result<i64, String> {
    let planted = parse_record_date(planting)
        .map_err(|e| format!("Invalid planting date '{}': {}", planting, e))?;
    let harvested = parse_record_date(harvest)
        .map_err(|e| format!("Invalid harvest date '{}': {}", harvest, e))?;
    Ok((harvested - planted).num_days())
}

/// Days between planting and harvest (negative when harvest precedes planting)
#[wasm_bindgen]
pub fn growth_period_days(planting_date: &str, harvest_date: &str) -> Result<i32, JsValue> {
    let days = growth_period(planting_date, harvest_date).map_err(js_error)?;
    i32::try_from(days).map_err(|_| js_error(format!("Growth period out of range: {}", days)))
}

/// Normalize a record date to `YYYY-MM-DD`
#[wasm_bindgen]
pub fn normalize_record_date(raw: &str) -> Result<String, JsValue> {
    parse_record_date(raw)
        .map(format_record_date)
        .map_err(|e| js_error(format!("Invalid date '{}': {}", raw, e)))
}

fn yield_feature_vector(record_json: &str, clamp_growth_period: bool) -> Result<Vec<f64>, String> {
    let obs: Observation =
        serde_json::from_str(record_json).map_err(|e| format!("Invalid record JSON: {}", e))?;
    let policy = if clamp_growth_period {
        GrowthPeriodPolicy::Clamp
    } else {
        GrowthPeriodPolicy::Reject
    };
    let features = YieldFeatures::from_observation(&obs)
        .and_then(|features| features.with_growth_policy(policy))
        .map_err(|e| e.to_string())?;
    Ok(features.to_array().to_vec())
}

/// Yield model input vector, in column order, for one observation record
///
/// A harvest date before the planting date is an error unless
/// `clamp_growth_period` is set, in which case the growth period is 0.
#[wasm_bindgen]
pub fn yield_features(
    record_json: &str,
    clamp_growth_period: bool,
) -> Result<js_sys::Float64Array, JsValue> {
    let values = yield_feature_vector(record_json, clamp_growth_period).map_err(js_error)?;
    Ok(js_sys::Float64Array::from(values.as_slice()))
}

fn disease_feature_vector(
    conditions_json: &str,
    default_soil_moisture: f64,
) -> Result<Vec<f64>, String> {
    let env: EnvironmentalConditions = serde_json::from_str(conditions_json)
        .map_err(|e| format!("Invalid conditions JSON: {}", e))?;
    let features = DiseaseFeatures {
        humidity: env.humidity,
        temperature: env.temperature,
        rainfall: env.rainfall,
        soil_ph: env.soil_ph,
        soil_moisture: env.soil_moisture.unwrap_or(default_soil_moisture),
    };
    Ok(features.to_array().to_vec())
}

/// Disease model input vector, in column order, for the given conditions
#[wasm_bindgen]
pub fn disease_features(
    conditions_json: &str,
    default_soil_moisture: f64,
) -> Result<js_sys::Float64Array, JsValue> {
    let values =
        disease_feature_vector(conditions_json, default_soil_moisture).map_err(js_error)?;
    Ok(js_sys::Float64Array::from(values.as_slice()))
}

// ============================================================================
// Treatment Report
// ============================================================================

fn treatment_report(detection_json: &str) -> Result<String, String> {
    let primary: DiseasePrediction = serde_json::from_str(detection_json)
        .map_err(|e| format!("Invalid detection JSON: {}", e))?;
    let report = TreatmentReport::from_primary(&primary);
    serde_json::to_string(&report).map_err(|e| format!("Failed to encode report: {}", e))
}

/// Build the treatment report JSON for a top-ranked detection
#[wasm_bindgen]
pub fn build_treatment_report(detection_json: &str) -> Result<String, JsValue> {
    treatment_report(detection_json).map_err(js_error)
}
