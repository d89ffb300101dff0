//! Chart series projection over stored weight samples.
//!
//! # Invariants
//! - The window holds the trailing `days` distinct dates that have samples.
//! - Labels stay aligned with `morning_series`.

use crate::dates::format_date;
use crate::model::weight::{ChartSeries, Period, WeightSample};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Default)]
struct DaySlots {
    morning: Option<f64>,
    evening: Option<f64>,
}

/// Builds the chart series for the last `days` dates present in `samples`.
///
/// The primary series prefers the morning value and falls back to the
/// evening one. `days == 0` yields an empty series.
pub fn build_chart_series(samples: &[WeightSample], days: u32) -> ChartSeries {
    let mut by_date: BTreeMap<NaiveDate, DaySlots> = BTreeMap::new();
    for sample in samples {
        let slots = by_date.entry(sample.sample_date).or_default();
        match sample.period {
            Period::Morning => slots.morning = Some(sample.value),
            Period::Evening => slots.evening = Some(sample.value),
        }
    }

    let skip = by_date.len().saturating_sub(days as usize);
    let mut series = ChartSeries::default();
    for (date, slots) in by_date.into_iter().skip(skip) {
        if let Some(primary) = slots.morning.or(slots.evening) {
            series.morning_series.push(primary);
            series.labels.push(format_date(date));
        }
        if let Some(evening) = slots.evening {
            series.evening_series.push(evening);
        }
    }
    series
}
