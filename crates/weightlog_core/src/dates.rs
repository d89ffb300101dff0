//! Date normalization for user input and spreadsheet cells.
//!
//! # Responsibility
//! - Parse heterogeneous textual and serial dates into one `NaiveDate`.
//! - Render the canonical `YYYY/MM/DD` display and storage form.
//!
//! # Invariants
//! - Strategies run in the fixed order of `DATE_STRATEGIES`; the first one
//!   that consumes the whole input wins.
//! - A parsed date always satisfies `1900-01-01 <= date <= today`.
//! - `DateNormalizer::parse` never fails: unparseable input yields today.

use crate::model::cell::{render_number, CellValue};
use chrono::{Duration, Local, NaiveDate};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical display/storage pattern.
pub const CANONICAL_DATE_FORMAT: &str = "%Y/%m/%d";

/// Last serial day representable as a four-digit year (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;
/// Serials below this value sit before the phantom 1900-02-29.
const LEAP_BUG_SERIAL: f64 = 60.0;

static TIME_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+)[ T]([01]?\d|2[0-3]):([0-5]\d)(?::([0-5]\d)(?:\.\d+)?)?$")
        .expect("valid time suffix regex")
});

/// One parsing strategy in the ordered fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStrategy {
    /// A strict `chrono` pattern, optionally followed by a time of day.
    Pattern(&'static str),
    /// Spreadsheet serial day count.
    Serial,
}

/// Strategy chain, highest priority first.
pub const DATE_STRATEGIES: &[DateStrategy] = &[
    DateStrategy::Pattern("%Y-%m-%d"),
    DateStrategy::Pattern("%Y/%m/%d"),
    DateStrategy::Pattern("%Y%m%d"),
    DateStrategy::Pattern("%d-%m-%Y"),
    DateStrategy::Pattern("%d/%m/%Y"),
    DateStrategy::Pattern("%d.%m.%Y"),
    DateStrategy::Serial,
];

impl DateStrategy {
    /// Applies this strategy to trimmed input. Bounds are not checked here.
    pub fn apply(self, input: &str) -> Option<NaiveDate> {
        match self {
            Self::Pattern(pattern) => parse_pattern(input, pattern),
            Self::Serial => parse_serial_text(input),
        }
    }
}

/// Parser with an injectable notion of "today" for the upper bound.
///
/// Without an injected date the local clock is read on every call, so a
/// long-lived normalizer follows the calendar across midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateNormalizer {
    fixed_today: Option<NaiveDate>,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DateNormalizer {
    /// Uses the local calendar date as "today".
    pub fn new() -> Self {
        Self { fixed_today: None }
    }

    pub fn with_today(today: NaiveDate) -> Self {
        Self {
            fixed_today: Some(today),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Parses text, falling back to today on any failure.
    pub fn parse(&self, input: &str) -> NaiveDate {
        match self.parse_strict(input) {
            Some(date) => date,
            None => {
                debug!(
                    "event=date_parse module=dates status=fallback input_len={}",
                    input.chars().count()
                );
                self.today()
            }
        }
    }

    /// Parses text without the fallback; `None` when no strategy yields an
    /// in-bounds date.
    pub fn parse_strict(&self, input: &str) -> Option<NaiveDate> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let date = DATE_STRATEGIES
            .iter()
            .find_map(|strategy| strategy.apply(trimmed))?;
        self.within_bounds(date).then_some(date)
    }

    /// Parses a spreadsheet cell without the fallback.
    ///
    /// Numbers go through the same strategy chain as text, so `20240105`
    /// is read as a compact date and `45296` as a serial.
    pub fn parse_cell_strict(&self, cell: &CellValue) -> Option<NaiveDate> {
        match cell {
            CellValue::Empty => None,
            CellValue::Text(value) => self.parse_strict(value),
            CellValue::Number(value) => self.parse_strict(&render_number(*value)),
        }
    }

    /// Interprets a serial day count, bounds included.
    pub fn parse_serial(&self, serial: f64) -> Option<NaiveDate> {
        serial_to_date(serial).filter(|date| self.within_bounds(*date))
    }

    fn within_bounds(&self, date: NaiveDate) -> bool {
        date >= date_floor() && date <= self.today()
    }
}

/// Renders the canonical `YYYY/MM/DD` form.
pub fn format_date(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

/// Earliest accepted calendar date.
pub fn date_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn parse_pattern(input: &str, pattern: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(input, pattern) {
        return Some(date);
    }

    let caps = TIME_SUFFIX_RE.captures(input)?;
    let date_part = caps.get(1)?.as_str();
    NaiveDate::parse_from_str(date_part, pattern).ok()
}

fn parse_serial_text(input: &str) -> Option<NaiveDate> {
    let serial = input.parse::<f64>().ok()?;
    serial_to_date(serial)
}

/// Converts a serial day count using the 1900 date system.
///
/// Day 0 is 1899-12-30. Serials below 60 shift by two days and the rest by
/// one, mirroring the phantom 1900-02-29 of that date system.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial <= 0.0 || serial > MAX_SERIAL_DAY {
        return None;
    }

    let offset = if serial < LEAP_BUG_SERIAL { 2.0 } else { 1.0 };
    let days = (serial - offset).floor() as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(days))
}

#[cfg(test)]
mod tests {
    use super::{format_date, DateNormalizer, DateStrategy, DATE_STRATEGIES};
    use crate::model::cell::CellValue;
    use chrono::{Local, NaiveDate};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn normalizer() -> DateNormalizer {
        DateNormalizer::with_today(day(2025, 6, 30))
    }

    #[test]
    fn all_supported_shapes_yield_the_same_date() {
        let expected = day(2024, 1, 5);
        for input in [
            "2024-01-05",
            "2024/01/05",
            "20240105",
            "05-01-2024",
            "05/01/2024",
            "05.01.2024",
            "2024-01-05 07:30:00",
            "2024/01/05 07:30",
            "05-01-2024 23:59:59",
            "05/01/2024 00:00:00",
            "2024-01-05T08:15:00",
        ] {
            assert_eq!(
                normalizer().parse_strict(input),
                Some(expected),
                "input `{input}`"
            );
        }
    }

    #[test]
    fn strategies_are_tried_in_priority_order() {
        assert_eq!(DATE_STRATEGIES[0], DateStrategy::Pattern("%Y-%m-%d"));
        assert_eq!(DATE_STRATEGIES.last(), Some(&DateStrategy::Serial));
    }

    #[test]
    fn partial_matches_are_rejected() {
        let dates = normalizer();
        assert_eq!(dates.parse_strict("2024-01-05x"), None);
        assert_eq!(dates.parse_strict("2024/13/40"), None);
        assert_eq!(dates.parse_strict("2024-01-05 25:00:00"), None);
        assert_eq!(dates.parse_strict("yesterday"), None);
    }

    #[test]
    fn serial_dates_keep_the_leap_year_quirk() {
        let dates = normalizer();
        assert_eq!(dates.parse_strict("45296"), Some(day(2024, 1, 4)));
        assert_eq!(dates.parse_strict("45296.75"), Some(day(2024, 1, 4)));
        assert_eq!(dates.parse_serial(60.0), Some(day(1900, 2, 27)));
        assert_eq!(dates.parse_serial(59.0), Some(day(1900, 2, 25)));
        assert_eq!(dates.parse_serial(4.0), Some(day(1900, 1, 1)));
        assert_eq!(dates.parse_serial(3.0), None);
        assert_eq!(dates.parse_serial(0.0), None);
        assert_eq!(dates.parse_serial(-3.0), None);
        assert_eq!(dates.parse_serial(f64::NAN), None);
    }

    #[test]
    fn numeric_cells_use_text_strategies_first() {
        let dates = normalizer();
        assert_eq!(
            dates.parse_cell_strict(&CellValue::Number(20240105.0)),
            Some(day(2024, 1, 5))
        );
        assert_eq!(
            dates.parse_cell_strict(&CellValue::Number(45296.0)),
            Some(day(2024, 1, 4))
        );
        assert_eq!(dates.parse_cell_strict(&CellValue::Empty), None);
    }

    #[test]
    fn out_of_bounds_dates_fall_back_to_today() {
        let dates = normalizer();
        assert_eq!(dates.parse("2025-07-01"), dates.today());
        assert_eq!(dates.parse("1899-12-31"), dates.today());
        assert_eq!(dates.parse(""), dates.today());
        assert_eq!(dates.parse("   "), dates.today());
        assert_eq!(dates.parse("2025-06-30"), day(2025, 6, 30));
        assert_eq!(dates.parse("1900-01-01"), day(1900, 1, 1));
    }

    #[test]
    fn format_is_zero_padded_and_round_trips() {
        let dates = normalizer();
        for date in [day(1900, 1, 1), day(2000, 2, 29), day(2024, 1, 5), day(2025, 6, 30)] {
            let rendered = format_date(date);
            assert_eq!(format_date(dates.parse(&rendered)), rendered);
        }
        assert_eq!(format_date(day(2024, 3, 7)), "2024/03/07");
    }

    #[test]
    fn clock_backed_today_is_read_per_call() {
        let dates = DateNormalizer::new();
        let before = Local::now().date_naive();
        let today = dates.today();
        let after = Local::now().date_naive();
        assert!(before <= today && today <= after);
        assert_eq!(dates.parse_strict(&format_date(today)), Some(today));
        assert_ne!(dates, DateNormalizer::with_today(today));
    }

    #[test]
    fn injected_today_bounds_parsing() {
        let dates = DateNormalizer::with_today(day(2024, 1, 4));
        assert_eq!(dates.today(), day(2024, 1, 4));
        assert_eq!(dates.parse_strict("2024/01/05"), None);
        assert_eq!(dates.parse_strict("2024/01/04"), Some(day(2024, 1, 4)));
    }
}
