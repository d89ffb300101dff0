//! Weight sample model.
//!
//! # Responsibility
//! - Define the twice-daily weight measurement record.
//! - Map period codes and localized labels in both directions.
//!
//! # Invariants
//! - `value` lies in `[MIN_WEIGHT_JIN, MAX_WEIGHT_JIN]` inclusive.
//! - Internal storage only ever sees `Period::code()` values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lowest accepted weight, in jin (0.5 kg).
pub const MIN_WEIGHT_JIN: f64 = 20.0;
/// Highest accepted weight, in jin (0.5 kg).
pub const MAX_WEIGHT_JIN: f64 = 400.0;

/// Twice-daily measurement slot.
///
/// Ordering follows the day: `Morning < Evening`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Morning,
    Evening,
}

impl Period {
    /// Stable storage code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
        }
    }

    /// Localized label used in exported spreadsheets.
    pub fn localized_label(self) -> &'static str {
        match self {
            Self::Morning => "早晨",
            Self::Evening => "晚上",
        }
    }

    /// Parses a storage code only.
    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "morning" => Some(Self::Morning),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }

    /// Parses either a localized label or a storage code.
    ///
    /// Matching is case-sensitive: `Morning` is not a valid label.
    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "早晨" | "morning" => Some(Self::Morning),
            "晚上" | "evening" => Some(Self::Evening),
            _ => None,
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Validation errors for weight sample invariants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightValidationError {
    /// Value is NaN or infinite.
    NotFinite,
    /// Value lies outside `[MIN_WEIGHT_JIN, MAX_WEIGHT_JIN]`.
    OutOfRange(f64),
}

impl Display for WeightValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFinite => write!(f, "weight must be a finite number"),
            Self::OutOfRange(value) => write!(
                f,
                "weight {value} out of range {MIN_WEIGHT_JIN}-{MAX_WEIGHT_JIN}"
            ),
        }
    }
}

impl Error for WeightValidationError {}

/// One weight measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    /// Calendar day of the measurement.
    pub sample_date: NaiveDate,
    pub period: Period,
    /// Weight in jin.
    pub value: f64,
}

impl WeightSample {
    /// Creates a validated sample.
    pub fn new(
        sample_date: NaiveDate,
        period: Period,
        value: f64,
    ) -> Result<Self, WeightValidationError> {
        let sample = Self {
            sample_date,
            period,
            value,
        };
        sample.validate()?;
        Ok(sample)
    }

    /// Checks the value range invariant.
    pub fn validate(&self) -> Result<(), WeightValidationError> {
        validate_weight_value(self.value)
    }
}

/// Checks one raw weight value against the accepted range.
pub fn validate_weight_value(value: f64) -> Result<(), WeightValidationError> {
    if !value.is_finite() {
        return Err(WeightValidationError::NotFinite);
    }
    if !(MIN_WEIGHT_JIN..=MAX_WEIGHT_JIN).contains(&value) {
        return Err(WeightValidationError::OutOfRange(value));
    }
    Ok(())
}

/// Persisted weight row with its modification timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredWeight {
    pub sample: WeightSample,
    /// Last write time in epoch milliseconds.
    pub updated_at: i64,
}

/// Aggregate statistics over all stored weight samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightStatistics {
    /// Value of the chronologically first sample.
    pub initial: f64,
    pub lightest: f64,
    pub heaviest: f64,
    pub average: f64,
    /// `heaviest - lightest`.
    pub range: f64,
    pub sample_count: u64,
}

/// Chart-ready series over a trailing window of days.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Primary series: morning value, or evening value when morning is absent.
    pub morning_series: Vec<f64>,
    /// Evening values within the window, in date order.
    pub evening_series: Vec<f64>,
    /// `YYYY/MM/DD` labels aligned with `morning_series`.
    pub labels: Vec<String>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
