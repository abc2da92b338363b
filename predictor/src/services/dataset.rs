//! CSV import/export and dataset summaries

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PredictorError, PredictorResult};
use shared::{validate_observation, Observation};

const LIST_SEPARATOR: &str = ";";

/// Flat CSV row; list fields are `;`-joined
#[derive(Debug, Serialize, Deserialize)]
struct ObservationRow {
    crop_id: String,
    crop_name: String,
    region: String,
    planting_date: String,
    harvest_date: String,
    #[serde(rename = "yield")]
    yield_tons_per_hectare: f64,
    rainfall: f64,
    temperature: f64,
    humidity: f64,
    soil_ph: f64,
    soil_nitrogen: f64,
    soil_phosphorus: f64,
    soil_potassium: f64,
    soil_moisture: Option<f64>,
    diseases: String,
    pesticides: String,
}

fn join_list(items: &[String]) -> String {
    items.join(LIST_SEPARATOR)
}

fn split_list(cell: &str) -> Vec<String> {
    cell.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<&Observation> for ObservationRow {
    fn from(obs: &Observation) -> Self {
        ObservationRow {
            crop_id: obs.crop_id.clone(),
            crop_name: obs.crop_name.clone(),
            region: obs.region.clone(),
            planting_date: obs.planting_date.clone(),
            harvest_date: obs.harvest_date.clone(),
            yield_tons_per_hectare: obs.yield_tons_per_hectare,
            rainfall: obs.rainfall,
            temperature: obs.temperature,
            humidity: obs.humidity,
            soil_ph: obs.soil_ph,
            soil_nitrogen: obs.soil_nitrogen,
            soil_phosphorus: obs.soil_phosphorus,
            soil_potassium: obs.soil_potassium,
            soil_moisture: obs.soil_moisture,
            diseases: join_list(&obs.diseases),
            pesticides: join_list(&obs.pesticides),
        }
    }
}

impl From<ObservationRow> for Observation {
    fn from(row: ObservationRow) -> Self {
        Observation {
            crop_id: row.crop_id,
            crop_name: row.crop_name,
            region: row.region,
            planting_date: row.planting_date,
            harvest_date: row.harvest_date,
            yield_tons_per_hectare: row.yield_tons_per_hectare,
            rainfall: row.rainfall,
            temperature: row.temperature,
            humidity: row.humidity,
            soil_ph: row.soil_ph,
            soil_nitrogen: row.soil_nitrogen,
            soil_phosphorus: row.soil_phosphorus,
            soil_potassium: row.soil_potassium,
            soil_moisture: row.soil_moisture,
            diseases: split_list(&row.diseases),
            pesticides: split_list(&row.pesticides),
        }
    }
}

/// Read and validate observations; the first invalid row fails the whole file
pub fn read_observations<R: Read>(reader: R) -> PredictorResult<Vec<Observation>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut observations = Vec::new();

    for (line, result) in rdr.deserialize::<ObservationRow>().enumerate() {
        let row = result.map_err(|e| {
            PredictorError::Dataset(format!("Failed to parse record {}: {}", line + 1, e))
        })?;
        let obs = Observation::from(row);
        validate_observation(&obs).map_err(|msg| PredictorError::malformed(&obs.crop_id, msg))?;
        observations.push(obs);
    }

    Ok(observations)
}

pub fn write_observations<W: Write>(
    writer: W,
    observations: &[Observation],
) -> PredictorResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for obs in observations {
        wtr.serialize(ObservationRow::from(obs)).map_err(|e| {
            PredictorError::Dataset(format!("Failed to write record {}: {}", obs.crop_id, e))
        })?;
    }
    wtr.flush()
        .map_err(|e| PredictorError::Dataset(format!("Failed to flush CSV: {}", e)))?;
    Ok(())
}

pub fn read_csv(path: &Path) -> PredictorResult<Vec<Observation>> {
    let file = std::fs::File::open(path)
        .map_err(|e| PredictorError::Dataset(format!("Cannot open {}: {}", path.display(), e)))?;
    let observations = read_observations(file)?;
    tracing::info!(path = %path.display(), records = observations.len(), "Loaded dataset");
    Ok(observations)
}

pub fn write_csv(path: &Path, observations: &[Observation]) -> PredictorResult<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| PredictorError::Dataset(format!("Cannot create {}: {}", path.display(), e)))?;
    write_observations(file, observations)?;
    tracing::info!(path = %path.display(), records = observations.len(), "Wrote dataset");
    Ok(())
}

// ============================================================================
// Summary
// ============================================================================

/// Overview of a set of observations
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatasetSummary {
    pub records: usize,
    /// Distinct crop names, sorted
    pub crops: Vec<String>,
    /// Distinct regions, sorted
    pub regions: Vec<String>,
    pub mean_yield_by_crop: BTreeMap<String, f64>,
    pub mean_yield_by_region: BTreeMap<String, f64>,
    /// Observations per risk label
    pub risk_distribution: BTreeMap<String, usize>,
}

fn mean_by<F>(observations: &[Observation], key: F) -> BTreeMap<String, f64>
where
    F: Fn(&Observation) -> &str,
{
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for obs in observations {
        let entry = totals.entry(key(obs).to_string()).or_insert((0.0, 0));
        entry.0 += obs.yield_tons_per_hectare;
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}

pub fn summarize(observations: &[Observation]) -> DatasetSummary {
    let crops: BTreeSet<&str> = observations.iter().map(|o| o.crop_name.as_str()).collect();
    let regions: BTreeSet<&str> = observations.iter().map(|o| o.region.as_str()).collect();

    let mut risk_distribution = BTreeMap::new();
    for obs in observations {
        *risk_distribution
            .entry(obs.risk_level().as_str().to_string())
            .or_insert(0) += 1;
    }

    DatasetSummary {
        records: observations.len(),
        crops: crops.into_iter().map(str::to_string).collect(),
        regions: regions.into_iter().map(str::to_string).collect(),
        mean_yield_by_crop: mean_by(observations, |o| o.crop_name.as_str()),
        mean_yield_by_region: mean_by(observations, |o| o.region.as_str()),
        risk_distribution,
    }
}
