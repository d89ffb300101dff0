//! Named-sheet workbook access.
//!
//! # Responsibility
//! - Read one sheet into a header plus untyped rows.
//! - Write a set of sheets into one `.xlsx` file.
//!
//! # Invariants
//! - A missing sheet reads as `Ok(None)`, never as an error.
//! - Fully blank rows are dropped on read.
//! - `RawImportRow::row_number` is the 1-based spreadsheet row.

use crate::model::cell::{CellValue, RawImportRow};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Text rendering used for date-typed cells.
const DATETIME_CELL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const COLUMN_PADDING: usize = 2;

#[derive(Debug)]
pub enum WorkbookError {
    Read(String),
    Write(String),
}

impl Display for WorkbookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(message) => write!(f, "failed to read workbook: {message}"),
            Self::Write(message) => write!(f, "failed to write workbook: {message}"),
        }
    }
}

impl Error for WorkbookError {}

/// One named sheet: a header row plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<RawImportRow>,
    /// Upper bound for fitted column widths on write.
    pub max_column_width: Option<f64>,
}

impl SheetTable {
    pub fn new(name: impl Into<String>, header: &[&str]) -> Self {
        Self {
            name: name.into(),
            header: header.iter().map(|column| column.to_string()).collect(),
            rows: Vec::new(),
            max_column_width: None,
        }
    }

    pub fn with_max_column_width(mut self, width: f64) -> Self {
        self.max_column_width = Some(width);
        self
    }

    /// Appends a data row numbered after the header.
    pub fn push_row(&mut self, cells: Vec<CellValue>) {
        let row_number = self.rows.len() + 2;
        self.rows.push(RawImportRow::new(row_number, cells));
    }

    /// Index of `column` in the header, ignoring surrounding whitespace.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header.iter().position(|name| name.trim() == column)
    }

    /// Column widths sized to content: longest cell plus padding, capped.
    pub fn fit_column_widths(&self) -> Vec<f64> {
        let mut widths = self
            .header
            .iter()
            .map(|name| name.chars().count())
            .collect::<Vec<_>>();
        for row in &self.rows {
            for (idx, cell) in row.cells.iter().enumerate() {
                let len = cell.to_text().chars().count();
                match widths.get_mut(idx) {
                    Some(width) => *width = (*width).max(len),
                    None => widths.push(len),
                }
            }
        }

        widths
            .into_iter()
            .map(|chars| {
                let width = (chars + COLUMN_PADDING) as f64;
                match self.max_column_width {
                    Some(cap) => width.min(cap),
                    None => width,
                }
            })
            .collect()
    }
}

/// File-format seam for the import/export reconciler.
pub trait WorkbookIo {
    /// Reads sheet `name`; `Ok(None)` when the workbook has no such sheet.
    fn read_sheet(&self, path: &Path, name: &str) -> Result<Option<SheetTable>, WorkbookError>;
    /// Writes `sheets` in order, replacing any existing file.
    fn write_sheets(&self, path: &Path, sheets: &[SheetTable]) -> Result<(), WorkbookError>;
}

/// `.xlsx` implementation backed by `calamine` (read) and
/// `rust_xlsxwriter` (write).
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxWorkbookIo;

impl WorkbookIo for XlsxWorkbookIo {
    fn read_sheet(&self, path: &Path, name: &str) -> Result<Option<SheetTable>, WorkbookError> {
        let mut workbook: Xlsx<_> = open_workbook(path)
            .map_err(|err| WorkbookError::Read(format!("cannot open workbook: {err}")))?;

        if !workbook.sheet_names().iter().any(|sheet| sheet == name) {
            return Ok(None);
        }

        let range = workbook
            .worksheet_range(name)
            .map_err(|err| WorkbookError::Read(format!("cannot read sheet `{name}`: {err}")))?;
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

        let mut rows = range.rows().enumerate();
        let header = match rows.next() {
            Some((_, cells)) => cells
                .iter()
                .map(|cell| cell_value(cell).to_text().trim().to_string())
                .collect(),
            None => Vec::new(),
        };

        let mut table = SheetTable {
            name: name.to_string(),
            header,
            rows: Vec::new(),
            max_column_width: None,
        };
        for (idx, cells) in rows {
            let row = RawImportRow::new(first_row + idx + 1, cells.iter().map(cell_value).collect());
            if !row.is_blank() {
                table.rows.push(row);
            }
        }
        Ok(Some(table))
    }

    fn write_sheets(&self, path: &Path, sheets: &[SheetTable]) -> Result<(), WorkbookError> {
        let mut workbook = Workbook::new();

        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(&sheet.name)
                .map_err(|err| WorkbookError::Write(format!("sheet `{}`: {err}", sheet.name)))?;

            for (col, name) in sheet.header.iter().enumerate() {
                worksheet
                    .write_string(0, col as u16, name)
                    .map_err(|err| WorkbookError::Write(err.to_string()))?;
            }

            for (idx, row) in sheet.rows.iter().enumerate() {
                let row_idx = (idx + 1) as u32;
                for (col, cell) in row.cells.iter().enumerate() {
                    let written = match cell {
                        CellValue::Empty => continue,
                        CellValue::Text(text) => worksheet.write_string(row_idx, col as u16, text),
                        CellValue::Number(value) => {
                            worksheet.write_number(row_idx, col as u16, *value)
                        }
                    };
                    written.map_err(|err| WorkbookError::Write(err.to_string()))?;
                }
            }

            for (col, width) in sheet.fit_column_widths().into_iter().enumerate() {
                worksheet
                    .set_column_width(col as u16, width)
                    .map_err(|err| WorkbookError::Write(err.to_string()))?;
            }
        }

        workbook
            .save(path)
            .map_err(|err| WorkbookError::Write(format!("cannot save `{}`: {err}", path.display())))
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            if text.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(text.clone())
            }
        }
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Text(value.to_string()),
        Data::Error(err) => CellValue::Text(format!("#{err:?}")),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) => CellValue::Text(datetime.format(DATETIME_CELL_FORMAT).to_string()),
            None => CellValue::Number(value.as_f64()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::SheetTable;
    use crate::model::cell::CellValue;

    #[test]
    fn column_widths_follow_content_and_respect_the_cap() {
        let mut table = SheetTable::new("t", &["a", "bb"]).with_max_column_width(6.0);
        table.push_row(vec![CellValue::text("abc"), CellValue::text("a much longer text")]);
        assert_eq!(table.fit_column_widths(), vec![5.0, 6.0]);
    }

    #[test]
    fn pushed_rows_are_numbered_after_the_header() {
        let mut table = SheetTable::new("t", &["a"]);
        table.push_row(vec![1.0.into()]);
        table.push_row(vec![2.0.into()]);
        assert_eq!(table.rows[0].row_number, 2);
        assert_eq!(table.rows[1].row_number, 3);
    }

    #[test]
    fn header_lookup_ignores_padding() {
        let mut table = SheetTable::new("t", &[]);
        table.header = vec![" 日期 ".to_string(), "体重(斤)".to_string()];
        assert_eq!(table.column_index("日期"), Some(0));
        assert_eq!(table.column_index("体重(斤)"), Some(1));
        assert_eq!(table.column_index("时间类型"), None);
    }
}
