//! Untyped spreadsheet cells and rows.
//!
//! # Invariants
//! - Rows are transient: they must pass validation before persistence.
//! - `row_number` is the 1-based line in the source sheet (header is line 1).

use std::fmt::{Display, Formatter};

/// One untyped cell as read from an external tabular file.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns `true` for `Empty` and for whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(value) => value.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Coerces the cell into display text.
    ///
    /// Integral numbers render without a fractional part so that a compact
    /// date such as `20240105` survives the round trip through a float cell.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(value) => value.clone(),
            Self::Number(value) => render_number(*value),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("<empty>"),
            other => f.write_str(&other.to_text()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Option<&str>> for CellValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, Self::from)
    }
}

/// Ordered cells of one data row plus its source line number.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImportRow {
    pub row_number: usize,
    pub cells: Vec<CellValue>,
}

impl RawImportRow {
    pub fn new(row_number: usize, cells: Vec<CellValue>) -> Self {
        Self { row_number, cells }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_blank)
    }
}

impl Display for RawImportRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        for (index, cell) in self.cells.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{cell}")?;
        }
        f.write_str(")")
    }
}

pub(crate) fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::{CellValue, RawImportRow};

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(20240105.0).to_text(), "20240105");
        assert_eq!(CellValue::Number(65.2).to_text(), "65.2");
    }

    #[test]
    fn blank_detection_covers_whitespace_text() {
        let row = RawImportRow::new(
            2,
            vec![CellValue::Empty, CellValue::text("  "), CellValue::Empty],
        );
        assert!(row.is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn row_display_lists_cells() {
        let row = RawImportRow::new(
            3,
            vec![CellValue::text("2024/01/05"), CellValue::Empty, 64.0.into()],
        );
        assert_eq!(row.to_string(), "(2024/01/05, <empty>, 64)");
    }
}
