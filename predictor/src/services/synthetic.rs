//! Synthetic Kenyan crop records
//!
//! Yield and disease outcomes follow simple agronomic rules so the models
//! have real structure to learn:
//! - crop-specific baseline yield and weather distributions
//! - yield penalties for rainfall, temperature and soil pH outside their bands
//! - fungal infections in warm humid conditions, root rot under heavy rain
//!
//! Output is a pure function of `(n, seed)` and the reference year.

use chrono::{Days, NaiveDate};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::config::GeneratorConfig;
use crate::error::{PredictorError, PredictorResult};
use shared::{format_record_date, Observation, KENYAN_CROPS, KENYAN_REGIONS};

pub const FUNGAL_INFECTION: &str = "Fungal infections";
pub const ROOT_ROT: &str = "Root rot";
/// Applied whenever any disease was observed
pub const TREATMENT_PESTICIDES: [&str; 2] = ["Fungicide", "Organic spray"];

const FUNGAL_PROBABILITY: f64 = 0.3;
const ROOT_ROT_PROBABILITY: f64 = 0.2;

// ============================================================================
// Crop profiles
// ============================================================================

/// Mean and standard deviation of a normal draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    pub mean: f64,
    pub std_dev: f64,
}

impl Normal {
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }

    /// Box-Muller transform on two uniform draws
    fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        // (0, 1] keeps ln finite
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        self.mean + self.std_dev * z
    }
}

/// Baseline yield (t/ha) and growing-season weather for one crop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropProfile {
    pub base_yield: f64,
    pub rainfall: Normal,
    pub temperature: Normal,
}

const COFFEE: CropProfile = CropProfile {
    base_yield: 15.0,
    rainfall: Normal::new(1200.0, 200.0),
    temperature: Normal::new(20.0, 3.0),
};

const MAIZE: CropProfile = CropProfile {
    base_yield: 40.0,
    rainfall: Normal::new(800.0, 150.0),
    temperature: Normal::new(25.0, 4.0),
};

const TEA: CropProfile = CropProfile {
    base_yield: 25.0,
    rainfall: Normal::new(1500.0, 300.0),
    temperature: Normal::new(18.0, 2.0),
};

const GENERIC: CropProfile = CropProfile {
    base_yield: 20.0,
    rainfall: Normal::new(700.0, 200.0),
    temperature: Normal::new(24.0, 3.0),
};

pub fn crop_profile(crop: &str) -> &'static CropProfile {
    match crop {
        "Coffee" => &COFFEE,
        "Maize" => &MAIZE,
        "Tea" => &TEA,
        _ => &GENERIC,
    }
}

const HUMIDITY: Normal = Normal::new(70.0, 15.0);
const SOIL_PH: Normal = Normal::new(6.2, 0.8);
const SOIL_NITROGEN: Normal = Normal::new(25.0, 10.0);
const SOIL_PHOSPHORUS: Normal = Normal::new(20.0, 8.0);
const SOIL_POTASSIUM: Normal = Normal::new(150.0, 50.0);
const YIELD_NOISE: Normal = Normal::new(1.0, 0.2);

// ============================================================================
// Yield adjustments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowingFactor {
    Rainfall,
    Temperature,
    SoilPh,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Band {
    Below(f64),
    Above(f64),
}

impl Band {
    fn contains(&self, value: f64) -> bool {
        match *self {
            Band::Below(limit) => value < limit,
            Band::Above(limit) => value > limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldAdjustment {
    pub factor: GrowingFactor,
    pub band: Band,
    pub multiplier: f64,
}

/// Yield penalties, checked in order. At most one row per factor applies.
pub const YIELD_ADJUSTMENTS: [YieldAdjustment; 6] = [
    YieldAdjustment {
        factor: GrowingFactor::Rainfall,
        band: Band::Below(500.0),
        multiplier: 0.7,
    },
    YieldAdjustment {
        factor: GrowingFactor::Rainfall,
        band: Band::Above(1500.0),
        multiplier: 0.8,
    },
    YieldAdjustment {
        factor: GrowingFactor::Temperature,
        band: Band::Below(15.0),
        multiplier: 0.6,
    },
    YieldAdjustment {
        factor: GrowingFactor::Temperature,
        band: Band::Above(35.0),
        multiplier: 0.6,
    },
    YieldAdjustment {
        factor: GrowingFactor::SoilPh,
        band: Band::Below(5.5),
        multiplier: 0.8,
    },
    YieldAdjustment {
        factor: GrowingFactor::SoilPh,
        band: Band::Above(7.5),
        multiplier: 0.8,
    },
];

/// Combined yield multiplier for the given growing conditions
pub fn yield_multiplier(rainfall: f64, temperature: f64, soil_ph: f64) -> f64 {
    let mut applied: Vec<GrowingFactor> = Vec::with_capacity(3);
    let mut multiplier = 1.0;

    for rule in &YIELD_ADJUSTMENTS {
        if applied.contains(&rule.factor) {
            continue;
        }
        let value = match rule.factor {
            GrowingFactor::Rainfall => rainfall,
            GrowingFactor::Temperature => temperature,
            GrowingFactor::SoilPh => soil_ph,
        };
        if rule.band.contains(value) {
            multiplier *= rule.multiplier;
            applied.push(rule.factor);
        }
    }

    multiplier
}

// ============================================================================
// Generator
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SyntheticDataGenerator {
    config: GeneratorConfig,
}

impl SyntheticDataGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generate using the configured sample count and seed
    pub fn generate_default(&self) -> PredictorResult<Vec<Observation>> {
        self.generate(self.config.samples, self.config.seed)
    }

    pub fn generate(&self, n: usize, seed: u64) -> PredictorResult<Vec<Observation>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let records = (0..n)
            .map(|i| self.record(i, &mut rng))
            .collect::<PredictorResult<Vec<_>>>()?;

        tracing::debug!(records = records.len(), seed, "Generated synthetic records");
        Ok(records)
    }

    fn record<R: Rng>(&self, i: usize, rng: &mut R) -> PredictorResult<Observation> {
        let crop = KENYAN_CROPS[rng.gen_range(0..KENYAN_CROPS.len())];
        let region = KENYAN_REGIONS[rng.gen_range(0..KENYAN_REGIONS.len())];
        let profile = crop_profile(crop);

        let rainfall = profile.rainfall.sample(rng);
        let temperature = profile.temperature.sample(rng);
        let humidity = HUMIDITY.sample(rng);
        let soil_ph = SOIL_PH.sample(rng);
        let soil_nitrogen = SOIL_NITROGEN.sample(rng);
        let soil_phosphorus = SOIL_PHOSPHORUS.sample(rng);
        let soil_potassium = SOIL_POTASSIUM.sample(rng);

        let month: u32 = rng.gen_range(1..=12);
        let growth_period: u64 = rng.gen_range(90..240);
        let day: u32 = rng.gen_range(1..=28);

        let year = self.config.reference_year;
        let planting = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            PredictorError::InvalidInput(format!("Invalid reference year {}", year))
        })?;
        let harvest = planting
            .checked_add_days(Days::new(growth_period))
            .ok_or_else(|| {
                PredictorError::InvalidInput(format!("Harvest date overflows year {}", year))
            })?;

        let multiplier = yield_multiplier(rainfall, temperature, soil_ph);
        let noise = YIELD_NOISE.sample(rng);
        let yield_tons = (profile.base_yield * multiplier * noise).max(0.0);

        let mut diseases = Vec::new();
        if humidity > 80.0 && temperature > 20.0 && rng.gen::<f64>() < FUNGAL_PROBABILITY {
            diseases.push(FUNGAL_INFECTION.to_string());
        }
        if rainfall > 1000.0 && rng.gen::<f64>() < ROOT_ROT_PROBABILITY {
            diseases.push(ROOT_ROT.to_string());
        }

        let pesticides = if diseases.is_empty() {
            Vec::new()
        } else {
            TREATMENT_PESTICIDES.iter().map(|p| p.to_string()).collect()
        };

        Ok(Observation {
            crop_id: format!("crop_{}", i),
            crop_name: crop.to_string(),
            region: region.to_string(),
            planting_date: format_record_date(planting),
            harvest_date: format_record_date(harvest),
            yield_tons_per_hectare: yield_tons,
            rainfall: rainfall.max(0.0),
            temperature,
            humidity: humidity.clamp(0.0, 100.0),
            soil_ph: soil_ph.clamp(4.0, 9.0),
            soil_nitrogen: soil_nitrogen.max(0.0),
            soil_phosphorus: soil_phosphorus.max(0.0),
            soil_potassium: soil_potassium.max(0.0),
            soil_moisture: None,
            diseases,
            pesticides,
        })
    }
}
