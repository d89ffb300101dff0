//! Row validation for spreadsheet imports.
//!
//! # Responsibility
//! - Turn untyped `RawImportRow`s into `WeightSample`/`JournalEntry` values.
//! - Normalize period labels (localized or internal) to `Period`.
//!
//! # Invariants
//! - Validation is pure: diagnostics are returned, never logged.
//! - Dates are parsed strictly; an unparseable date rejects the row instead
//!   of falling back to today.
//! - Journal rows are never rejected for empty text.

use crate::dates::DateNormalizer;
use crate::model::cell::{CellValue, RawImportRow};
use crate::model::journal::JournalEntry;
use crate::model::weight::{
    validate_weight_value, Period, WeightSample, WeightValidationError, MAX_WEIGHT_JIN,
    MIN_WEIGHT_JIN,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of cells a weight or journal row must carry.
pub const REQUIRED_CELLS: usize = 3;

/// Why one imported row was excluded.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    InsufficientFields { found: usize },
    InvalidDate(String),
    InvalidCategory(String),
    InvalidWeight(String),
    OutOfRange(f64),
}

impl Display for RejectionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientFields { found } => write!(
                f,
                "insufficient fields: expected {REQUIRED_CELLS}, found {found}"
            ),
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`"),
            Self::InvalidCategory(value) => write!(
                f,
                "invalid category `{value}`; expected 早晨|晚上|morning|evening"
            ),
            Self::InvalidWeight(value) => write!(f, "invalid weight `{value}`"),
            Self::OutOfRange(value) => write!(
                f,
                "weight {value} out of range {MIN_WEIGHT_JIN}-{MAX_WEIGHT_JIN}"
            ),
        }
    }
}

impl Error for RejectionReason {}

/// One excluded row with its reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub row: RawImportRow,
    pub reason: RejectionReason,
}

impl Rejection {
    /// Human-readable line suitable for a warning list.
    pub fn describe(&self) -> String {
        format!("row {}: {}", self.row.row_number, self.reason)
    }
}

/// Accepted values and rejected rows of one validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome<T> {
    pub accepted: Vec<T>,
    pub rejected: Vec<Rejection>,
}

impl<T> Default for ValidationOutcome<T> {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> ValidationOutcome<T> {
    fn push(&mut self, row: RawImportRow, result: Result<T, RejectionReason>) {
        match result {
            Ok(value) => self.accepted.push(value),
            Err(reason) => self.rejected.push(Rejection { row, reason }),
        }
    }
}

/// Validates raw rows against weight and journal rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordValidator {
    dates: DateNormalizer,
}

impl RecordValidator {
    pub fn new(dates: DateNormalizer) -> Self {
        Self { dates }
    }

    /// Validates a `(date, period, value)` row.
    ///
    /// Checks run in order and the first failure wins: cell count, date,
    /// period label, numeric value, value range.
    pub fn validate_weight_row(&self, raw: &RawImportRow) -> Result<WeightSample, RejectionReason> {
        let [date_cell, period_cell, value_cell] = required_cells(raw)?;

        let sample_date = self.parse_date(date_cell)?;

        let period = match period_cell {
            CellValue::Text(label) => Period::from_label(label.trim()),
            _ => None,
        }
        .ok_or_else(|| RejectionReason::InvalidCategory(period_cell.to_text()))?;

        let value = parse_weight(value_cell)?;
        validate_weight_value(value).map_err(|err| match err {
            WeightValidationError::OutOfRange(value) => RejectionReason::OutOfRange(value),
            WeightValidationError::NotFinite => RejectionReason::InvalidWeight(value_cell.to_text()),
        })?;

        Ok(WeightSample {
            sample_date,
            period,
            value,
        })
    }

    /// Validates a `(date, food, thoughts)` row.
    pub fn validate_journal_row(&self, raw: &RawImportRow) -> Result<JournalEntry, RejectionReason> {
        let [date_cell, food_cell, thoughts_cell] = required_cells(raw)?;
        let entry_date = self.parse_date(date_cell)?;
        Ok(JournalEntry {
            entry_date,
            food_text: food_cell.to_text(),
            thoughts_text: thoughts_cell.to_text(),
        })
    }

    pub fn validate_weight_rows(
        &self,
        rows: impl IntoIterator<Item = RawImportRow>,
    ) -> ValidationOutcome<WeightSample> {
        let mut outcome = ValidationOutcome::default();
        for row in rows {
            let result = self.validate_weight_row(&row);
            outcome.push(row, result);
        }
        outcome
    }

    pub fn validate_journal_rows(
        &self,
        rows: impl IntoIterator<Item = RawImportRow>,
    ) -> ValidationOutcome<JournalEntry> {
        let mut outcome = ValidationOutcome::default();
        for row in rows {
            let result = self.validate_journal_row(&row);
            outcome.push(row, result);
        }
        outcome
    }

    fn parse_date(&self, cell: &CellValue) -> Result<chrono::NaiveDate, RejectionReason> {
        self.dates
            .parse_cell_strict(cell)
            .ok_or_else(|| RejectionReason::InvalidDate(cell.to_text()))
    }
}

fn required_cells(raw: &RawImportRow) -> Result<[&CellValue; REQUIRED_CELLS], RejectionReason> {
    match raw.cells.as_slice() {
        [first, second, third, ..] => Ok([first, second, third]),
        cells => Err(RejectionReason::InsufficientFields { found: cells.len() }),
    }
}

fn parse_weight(cell: &CellValue) -> Result<f64, RejectionReason> {
    let parsed = match cell {
        CellValue::Number(value) => Some(*value),
        CellValue::Text(text) => text.trim().parse::<f64>().ok(),
        CellValue::Empty => None,
    };
    parsed
        .filter(|value| value.is_finite())
        .ok_or_else(|| RejectionReason::InvalidWeight(cell.to_text()))
}

#[cfg(test)]
mod tests {
    use super::{RecordValidator, RejectionReason};
    use crate::dates::DateNormalizer;
    use crate::model::cell::{CellValue, RawImportRow};
    use crate::model::weight::Period;
    use chrono::NaiveDate;

    fn validator() -> RecordValidator {
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");
        RecordValidator::new(DateNormalizer::with_today(today))
    }

    fn weight_row(date: &str, period: &str, value: CellValue) -> RawImportRow {
        RawImportRow::new(2, vec![date.into(), period.into(), value])
    }

    #[test]
    fn weight_bounds_are_inclusive() {
        let validator = validator();
        for accepted in [20.0, 400.0] {
            let sample = validator
                .validate_weight_row(&weight_row("2024/01/05", "早晨", accepted.into()))
                .expect("boundary value should be accepted");
            assert_eq!(sample.value, accepted);
        }
        for rejected in [19.999, 400.001] {
            let err = validator
                .validate_weight_row(&weight_row("2024/01/05", "早晨", rejected.into()))
                .expect_err("value outside range must be rejected");
            assert_eq!(err, RejectionReason::OutOfRange(rejected));
        }
    }

    #[test]
    fn both_label_sets_map_to_internal_periods() {
        let validator = validator();
        let cases = [
            ("早晨", Period::Morning),
            ("morning", Period::Morning),
            ("晚上", Period::Evening),
            (" evening ", Period::Evening),
        ];
        for (label, expected) in cases {
            let sample = validator
                .validate_weight_row(&weight_row("2024/01/05", label, 60.0.into()))
                .expect("known label should validate");
            assert_eq!(sample.period, expected);
        }
    }

    #[test]
    fn labels_are_case_sensitive() {
        let err = validator()
            .validate_weight_row(&weight_row("2024/01/05", "Morning", 60.0.into()))
            .expect_err("capitalized label must fail");
        assert_eq!(err, RejectionReason::InvalidCategory("Morning".to_string()));
    }

    #[test]
    fn first_failing_check_wins() {
        let validator = validator();
        let short = RawImportRow::new(4, vec!["2024/01/05".into(), "早晨".into()]);
        assert_eq!(
            validator.validate_weight_row(&short),
            Err(RejectionReason::InsufficientFields { found: 2 })
        );

        let bad_date = weight_row("2024/13/40", "bogus", CellValue::text("abc"));
        assert_eq!(
            validator.validate_weight_row(&bad_date),
            Err(RejectionReason::InvalidDate("2024/13/40".to_string()))
        );

        let bad_weight = weight_row("2024/01/05", "晚上", CellValue::text("heavy"));
        assert_eq!(
            validator.validate_weight_row(&bad_weight),
            Err(RejectionReason::InvalidWeight("heavy".to_string()))
        );
    }

    #[test]
    fn textual_weights_are_parsed() {
        let sample = validator()
            .validate_weight_row(&weight_row("20240105", "晚上", CellValue::text(" 64.5 ")))
            .expect("numeric text should parse");
        assert_eq!(sample.value, 64.5);
    }

    #[test]
    fn journal_rows_accept_empty_text() {
        let row = RawImportRow::new(
            7,
            vec!["2024-02-01".into(), CellValue::Empty, CellValue::text("kept going")],
        );
        let entry = validator()
            .validate_journal_row(&row)
            .expect("empty food text is allowed");
        assert_eq!(entry.food_text, "");
        assert_eq!(entry.thoughts_text, "kept going");
    }

    #[test]
    fn batch_validation_collects_rejections_with_row_numbers() {
        let rows = vec![
            RawImportRow::new(2, vec!["2024/01/05".into(), "早晨".into(), 65.2.into()]),
            RawImportRow::new(3, vec!["2024/13/40".into(), "晚上".into(), 64.0.into()]),
        ];
        let outcome = validator().validate_weight_rows(rows);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        let message = outcome.rejected[0].describe();
        assert!(message.starts_with("row 3:"));
        assert!(message.contains("2024/13/40"));
    }
}
