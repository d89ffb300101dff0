//! Import/export reconciliation between the record store and a workbook.
//!
//! # Responsibility
//! - Export weight samples and journal entries to two named sheets.
//! - Import both sheets, validate row by row and replace the store.
//!
//! # Invariants
//! - Structural problems (capability, file, sheet header) abort before any
//!   row is validated.
//! - A rejected row becomes a warning `"<sheet> row N: reason"` and never
//!   aborts the import.
//! - An import with zero accepted rows leaves the store untouched.
//! - Period labels are localized only in exported files.

use crate::dates::format_date;
use crate::model::cell::{CellValue, RawImportRow};
use crate::model::journal::JournalEntry;
use crate::model::weight::WeightSample;
use crate::service::record_store::{RecordStore, StoreError};
use crate::transfer::export_dir::ExportDirectoryResolver;
use crate::transfer::workbook::{SheetTable, WorkbookError, WorkbookIo, XlsxWorkbookIo};
use crate::validation::RecordValidator;
use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

pub const WEIGHT_SHEET: &str = "体重记录";
pub const JOURNAL_SHEET: &str = "减肥日记";
pub const WEIGHT_COLUMNS: [&str; 3] = ["日期", "时间类型", "体重(斤)"];
pub const JOURNAL_COLUMNS: [&str; 3] = ["日期", "饮食记录", "减肥心得"];
pub const DEFAULT_EXPORT_FILE_NAME: &str = "weight_data_export.xlsx";

const XLSX_EXTENSION: &str = "xlsx";
const WEIGHT_COLUMN_WIDTH_CAP: f64 = 50.0;
const JOURNAL_COLUMN_WIDTH_CAP: f64 = 80.0;
const SUMMARY_WARNING_LIMIT: usize = 5;
/// Local file header, empty archive and spanned archive signatures.
const ZIP_SIGNATURES: [[u8; 4]; 3] = [*b"PK\x03\x04", *b"PK\x05\x06", *b"PK\x07\x08"];

/// Which transfer directions are available on this platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferCapabilities {
    pub can_read: bool,
    pub can_write: bool,
}

impl Default for TransferCapabilities {
    fn default() -> Self {
        Self {
            can_read: true,
            can_write: true,
        }
    }
}

/// Structural and storage failures of an import or export.
#[derive(Debug)]
pub enum TransferError {
    /// `"read"` or `"write"` is disabled by capabilities.
    CapabilityUnavailable(&'static str),
    SourceMissing(PathBuf),
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    UnsupportedFormat {
        path: PathBuf,
        reason: &'static str,
    },
    MissingColumns {
        sheet: String,
        columns: Vec<String>,
    },
    Workbook(WorkbookError),
    /// No row passed validation; carries the per-row warnings.
    NothingToImport {
        warnings: Vec<String>,
    },
    NothingToExport,
    /// Writer reported success but the file is empty.
    EmptyOutput(PathBuf),
    Store(StoreError),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CapabilityUnavailable(direction) => {
                write!(f, "spreadsheet {direction} support is unavailable")
            }
            Self::SourceMissing(path) => write!(f, "file not found: {}", path.display()),
            Self::SourceUnreadable { path, source } => {
                write!(f, "cannot read `{}`: {source}", path.display())
            }
            Self::UnsupportedFormat { path, reason } => {
                write!(f, "unsupported file `{}`: {reason}", path.display())
            }
            Self::MissingColumns { sheet, columns } => write!(
                f,
                "sheet `{sheet}` is missing required columns: {}",
                columns.join(", ")
            ),
            Self::Workbook(err) => write!(f, "{err}"),
            Self::NothingToImport { warnings } => write!(
                f,
                "no valid rows to import ({} row(s) rejected)",
                warnings.len()
            ),
            Self::NothingToExport => write!(f, "no records to export"),
            Self::EmptyOutput(path) => {
                write!(f, "export produced an empty file: {}", path.display())
            }
            Self::Store(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "I/O error at `{}`: {source}", path.display()),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SourceUnreadable { source, .. } | Self::Io { source, .. } => Some(source),
            Self::Workbook(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WorkbookError> for TransferError {
    fn from(value: WorkbookError) -> Self {
        Self::Workbook(value)
    }
}

impl From<StoreError> for TransferError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Outcome of a committed import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub accepted_weight_count: usize,
    pub accepted_journal_count: usize,
    pub warnings: Vec<String>,
}

impl ImportResult {
    /// Multi-line digest for display; warnings beyond the first few are
    /// counted, not listed.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Imported {} weight record(s) and {} journal entry(ies).",
            self.accepted_weight_count, self.accepted_journal_count
        )];
        push_warning_digest(&mut lines, &self.warnings);
        lines.join("\n")
    }
}

/// Outcome of a written export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportResult {
    pub path: PathBuf,
    pub byte_size: u64,
    pub weight_rows: usize,
    pub journal_rows: usize,
    /// Weights left out for being outside the accepted range.
    pub skipped_weights: usize,
    pub exported_at: NaiveDateTime,
}

impl ExportResult {
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Exported {} weight record(s) and {} journal entry(ies) to {} ({} bytes).",
            self.weight_rows,
            self.journal_rows,
            self.path.display(),
            self.byte_size
        )];
        if self.skipped_weights > 0 {
            lines.push(format!(
                "Skipped {} out-of-range weight record(s).",
                self.skipped_weights
            ));
        }
        lines.join("\n")
    }
}

/// Moves records between the store and an external workbook.
pub struct ImportExportReconciler<W: WorkbookIo> {
    workbook: W,
    validator: RecordValidator,
    capabilities: TransferCapabilities,
}

impl ImportExportReconciler<XlsxWorkbookIo> {
    /// `.xlsx` reconciler with default validation.
    pub fn xlsx(capabilities: TransferCapabilities) -> Self {
        Self::new(XlsxWorkbookIo, RecordValidator::default(), capabilities)
    }
}

impl<W: WorkbookIo> ImportExportReconciler<W> {
    pub fn new(workbook: W, validator: RecordValidator, capabilities: TransferCapabilities) -> Self {
        Self {
            workbook,
            validator,
            capabilities,
        }
    }

    /// Writes both sheets to `destination`, appending `.xlsx` when missing.
    pub fn export(
        &self,
        weights: &[WeightSample],
        journals: &[JournalEntry],
        destination: &Path,
    ) -> Result<ExportResult, TransferError> {
        if !self.capabilities.can_write {
            return Err(TransferError::CapabilityUnavailable("write"));
        }
        if weights.is_empty() && journals.is_empty() {
            return Err(TransferError::NothingToExport);
        }

        let path = with_xlsx_extension(destination);
        info!("event=export module=transfer status=start");

        let mut weight_sheet =
            SheetTable::new(WEIGHT_SHEET, &WEIGHT_COLUMNS).with_max_column_width(WEIGHT_COLUMN_WIDTH_CAP);
        let mut skipped_weights = 0;
        for sample in weights {
            if sample.validate().is_err() {
                skipped_weights += 1;
                continue;
            }
            weight_sheet.push_row(vec![
                format_date(sample.sample_date).into(),
                sample.period.localized_label().into(),
                sample.value.into(),
            ]);
        }
        if skipped_weights > 0 {
            warn!("event=export module=transfer status=partial skipped_weights={skipped_weights}");
        }

        let mut journal_sheet = SheetTable::new(JOURNAL_SHEET, &JOURNAL_COLUMNS)
            .with_max_column_width(JOURNAL_COLUMN_WIDTH_CAP);
        for entry in journals {
            journal_sheet.push_row(vec![
                format_date(entry.entry_date).into(),
                text_cell(&entry.food_text),
                text_cell(&entry.thoughts_text),
            ]);
        }

        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| TransferError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let weight_rows = weight_sheet.rows.len();
        let journal_rows = journal_sheet.rows.len();
        if let Err(err) = self.workbook.write_sheets(&path, &[weight_sheet, journal_sheet]) {
            error!("event=export module=transfer status=error error_code=write_failed");
            return Err(err.into());
        }

        let byte_size = std::fs::metadata(&path)
            .map_err(|source| TransferError::Io {
                path: path.clone(),
                source,
            })?
            .len();
        if byte_size == 0 {
            error!("event=export module=transfer status=error error_code=empty_output");
            return Err(TransferError::EmptyOutput(path));
        }

        info!(
            "event=export module=transfer status=ok weights={weight_rows} journals={journal_rows} bytes={byte_size}"
        );
        Ok(ExportResult {
            path,
            byte_size,
            weight_rows,
            journal_rows,
            skipped_weights,
            exported_at: Local::now().naive_local(),
        })
    }

    /// Exports everything currently in `store`.
    pub fn export_store(
        &self,
        store: &RecordStore,
        destination: &Path,
    ) -> Result<ExportResult, TransferError> {
        if !self.capabilities.can_write {
            return Err(TransferError::CapabilityUnavailable("write"));
        }
        let weights = store
            .get_all_weights()?
            .into_iter()
            .map(|stored| stored.sample)
            .collect::<Vec<_>>();
        let journals = store
            .get_all_journal()?
            .into_iter()
            .map(|stored| stored.entry)
            .collect::<Vec<_>>();
        self.export(&weights, &journals, destination)
    }

    /// Replaces the contents of `store` with the rows of `source`.
    pub fn import(&self, source: &Path, store: &RecordStore) -> Result<ImportResult, TransferError> {
        if !self.capabilities.can_read {
            return Err(TransferError::CapabilityUnavailable("read"));
        }
        check_source(source)?;
        info!("event=import module=transfer status=start");

        let weight_rows = self.read_projected(source, WEIGHT_SHEET, &WEIGHT_COLUMNS)?;
        let journal_rows = self.read_projected(source, JOURNAL_SHEET, &JOURNAL_COLUMNS)?;

        let weights = self.validator.validate_weight_rows(weight_rows);
        let journals = self.validator.validate_journal_rows(journal_rows);

        let mut warnings = weights
            .rejected
            .iter()
            .map(|rejection| format!("{WEIGHT_SHEET} {}", rejection.describe()))
            .chain(
                journals
                    .rejected
                    .iter()
                    .map(|rejection| format!("{JOURNAL_SHEET} {}", rejection.describe())),
            )
            .collect::<Vec<_>>();

        if weights.accepted.is_empty() && journals.accepted.is_empty() {
            warn!(
                "event=import module=transfer status=rejected error_code=nothing_to_import rejected={}",
                warnings.len()
            );
            return Err(TransferError::NothingToImport { warnings });
        }

        let report = store.bulk_replace(&weights.accepted, &journals.accepted)?;
        warnings.extend(report.warnings);

        info!(
            "event=import module=transfer status=ok weights={} journals={} warnings={}",
            report.weights_inserted,
            report.journals_inserted,
            warnings.len()
        );
        Ok(ImportResult {
            accepted_weight_count: report.weights_inserted,
            accepted_journal_count: report.journals_inserted,
            warnings,
        })
    }

    /// Reads `sheet` and reorders each row to `columns` by header name.
    fn read_projected(
        &self,
        path: &Path,
        sheet: &str,
        columns: &[&str],
    ) -> Result<Vec<RawImportRow>, TransferError> {
        let Some(table) = self.workbook.read_sheet(path, sheet)? else {
            warn!("event=import module=transfer status=partial error_code=sheet_missing");
            return Ok(Vec::new());
        };
        if table.rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut indices = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        for column in columns {
            match table.column_index(column) {
                Some(idx) => indices.push(idx),
                None => missing.push(column.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(TransferError::MissingColumns {
                sheet: sheet.to_string(),
                columns: missing,
            });
        }

        Ok(table
            .rows
            .into_iter()
            .map(|row| {
                let cells = indices
                    .iter()
                    .map_while(|idx| row.cells.get(*idx).cloned())
                    .collect();
                RawImportRow::new(row.row_number, cells)
            })
            .collect())
    }
}

/// Default export file inside the resolved export directory.
pub fn default_export_path(resolver: &impl ExportDirectoryResolver) -> Option<PathBuf> {
    resolver
        .resolve_export_directory()
        .map(|dir| dir.join(DEFAULT_EXPORT_FILE_NAME))
}

fn check_source(path: &Path) -> Result<(), TransferError> {
    if !path.exists() {
        return Err(TransferError::SourceMissing(path.to_path_buf()));
    }
    if !has_xlsx_extension(path) {
        return Err(TransferError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: "expected a .xlsx file",
        });
    }

    let mut magic = [0_u8; 4];
    let read = File::open(path).and_then(|mut file| file.read_exact(&mut magic));
    match read {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
            return Err(TransferError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "file is too short to be a workbook",
            });
        }
        Err(source) => {
            return Err(TransferError::SourceUnreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    if !ZIP_SIGNATURES.contains(&magic) {
        return Err(TransferError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: "not a zip-based workbook",
        });
    }
    Ok(())
}

fn has_xlsx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(XLSX_EXTENSION))
}

fn with_xlsx_extension(path: &Path) -> PathBuf {
    if has_xlsx_extension(path) {
        return path.to_path_buf();
    }
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(XLSX_EXTENSION);
    PathBuf::from(raw)
}

fn text_cell(value: &str) -> CellValue {
    if value.is_empty() {
        CellValue::Empty
    } else {
        CellValue::text(value)
    }
}

fn push_warning_digest(lines: &mut Vec<String>, warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    lines.push(format!("{} warning(s):", warnings.len()));
    lines.extend(
        warnings
            .iter()
            .take(SUMMARY_WARNING_LIMIT)
            .map(|warning| format!("- {warning}")),
    );
    if warnings.len() > SUMMARY_WARNING_LIMIT {
        lines.push(format!(
            "... and {} more",
            warnings.len() - SUMMARY_WARNING_LIMIT
        ));
    }
}
