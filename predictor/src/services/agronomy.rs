//! Soil health assessment over a set of observations

use serde::Serialize;

use crate::error::{PredictorError, PredictorResult};
use crate::ml::metrics::mean;
use shared::{NutrientStatus, Observation};

// (low, high) bands in mg/kg
const NITROGEN_BAND: (f64, f64) = (20.0, 40.0);
const PHOSPHORUS_BAND: (f64, f64) = (15.0, 30.0);
const POTASSIUM_BAND: (f64, f64) = (100.0, 200.0);

const ACIDIC_PH: f64 = 6.0;
const ALKALINE_PH: f64 = 7.5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NutrientAssessment {
    pub nitrogen: NutrientStatus,
    pub phosphorus: NutrientStatus,
    pub potassium: NutrientStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SoilHealthReport {
    pub samples: usize,
    pub average_ph: f64,
    pub average_nitrogen: f64,
    pub average_phosphorus: f64,
    pub average_potassium: f64,
    pub nutrient_status: NutrientAssessment,
    pub recommendations: Vec<String>,
}

pub fn assess_soil_health(observations: &[Observation]) -> PredictorResult<SoilHealthReport> {
    if observations.is_empty() {
        return Err(PredictorError::InvalidInput(
            "Soil health needs at least one observation".to_string(),
        ));
    }

    let column = |f: fn(&Observation) -> f64| mean(&observations.iter().map(f).collect::<Vec<_>>());
    let average_ph = column(|o| o.soil_ph);
    let average_nitrogen = column(|o| o.soil_nitrogen);
    let average_phosphorus = column(|o| o.soil_phosphorus);
    let average_potassium = column(|o| o.soil_potassium);

    let mut recommendations = Vec::new();
    if average_ph < ACIDIC_PH {
        recommendations.push("Apply lime to increase soil pH".to_string());
    }
    if average_ph > ALKALINE_PH {
        recommendations.push("Apply sulfur to decrease soil pH".to_string());
    }
    if average_nitrogen < NITROGEN_BAND.0 {
        recommendations.push("Apply nitrogen-rich fertilizer".to_string());
    }
    if average_phosphorus < PHOSPHORUS_BAND.0 {
        recommendations.push("Apply phosphorus fertilizer".to_string());
    }
    if average_potassium < POTASSIUM_BAND.0 {
        recommendations.push("Apply potassium fertilizer".to_string());
    }

    Ok(SoilHealthReport {
        samples: observations.len(),
        average_ph,
        average_nitrogen,
        average_phosphorus,
        average_potassium,
        nutrient_status: NutrientAssessment {
            nitrogen: NutrientStatus::classify(average_nitrogen, NITROGEN_BAND.0, NITROGEN_BAND.1),
            phosphorus: NutrientStatus::classify(
                average_phosphorus,
                PHOSPHORUS_BAND.0,
                PHOSPHORUS_BAND.1,
            ),
            potassium: NutrientStatus::classify(
                average_potassium,
                POTASSIUM_BAND.0,
                POTASSIUM_BAND.1,
            ),
        },
        recommendations,
    })
}
