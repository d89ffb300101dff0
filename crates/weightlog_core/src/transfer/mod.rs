//! Spreadsheet import/export.
//!
//! # Responsibility
//! - Reconcile the record store with an external two-sheet workbook.
//! - Keep file-format details behind the `WorkbookIo` trait.
//! - Pick a writable export directory.
//!
//! # Invariants
//! - Import is replace-all, never merge.
//! - Disabled capabilities fail before any file I/O.

pub mod export_dir;
pub mod locations;
pub mod reconciler;
pub mod workbook;

pub use export_dir::{ExportDirectoryResolver, FallbackExportDirectory};
pub use locations::{file_locations, FileLocations};
pub use reconciler::{
    default_export_path, ExportResult, ImportExportReconciler, ImportResult, TransferCapabilities,
    TransferError, DEFAULT_EXPORT_FILE_NAME, JOURNAL_COLUMNS, JOURNAL_SHEET, WEIGHT_COLUMNS,
    WEIGHT_SHEET,
};
pub use workbook::{SheetTable, WorkbookError, WorkbookIo, XlsxWorkbookIo};
