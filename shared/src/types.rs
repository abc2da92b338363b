//! Common types used across the platform

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Date format used by every record date written by the platform
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a record date.
///
/// Accepts plain ISO dates (`2024-03-15`) as well as the timestamp forms
/// produced by spreadsheet exports and browsers (`2024-03-15 00:00:00`,
/// `2024-03-15T00:00:00Z`). The time part, if any, is discarded.
pub fn parse_record_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let trimmed = raw.trim();
    let first_error = match NaiveDate::parse_from_str(trimmed, RECORD_DATE_FORMAT) {
        Ok(date) => return Ok(date),
        Err(e) => e,
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }

    Err(first_error)
}

/// Format a date the way records store it
pub fn format_record_date(date: NaiveDate) -> String {
    date.format(RECORD_DATE_FORMAT).to_string()
}

/// Crop-loss severity attached to a disease
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    None,
    Low,
    Moderate,
    High,
    #[default]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
            Severity::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nutrient level band used in soil health reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NutrientStatus {
    Low,
    Adequate,
    High,
}

impl NutrientStatus {
    /// Classify a value against a `(low, high)` band; the bounds themselves are adequate
    pub fn classify(value: f64, low: f64, high: f64) -> Self {
        if value < low {
            NutrientStatus::Low
        } else if value > high {
            NutrientStatus::High
        } else {
            NutrientStatus::Adequate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_timestamp_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_record_date("2024-03-15").unwrap(), expected);
        assert_eq!(parse_record_date(" 2024-03-15 ").unwrap(), expected);
        assert_eq!(parse_record_date("2024-03-15 08:30:00").unwrap(), expected);
        assert_eq!(parse_record_date("2024-03-15T08:30:00").unwrap(), expected);
        assert_eq!(parse_record_date("2024-03-15T08:30:00Z").unwrap(), expected);
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(parse_record_date("15/03/2024").is_err());
        assert!(parse_record_date("2024-02-30").is_err());
        assert!(parse_record_date("").is_err());
    }

    #[test]
    fn nutrient_bands_are_inclusive_at_bounds() {
        assert_eq!(NutrientStatus::classify(19.9, 20.0, 40.0), NutrientStatus::Low);
        assert_eq!(NutrientStatus::classify(20.0, 20.0, 40.0), NutrientStatus::Adequate);
        assert_eq!(NutrientStatus::classify(40.0, 20.0, 40.0), NutrientStatus::Adequate);
        assert_eq!(NutrientStatus::classify(40.1, 20.0, 40.0), NutrientStatus::High);
    }
}
