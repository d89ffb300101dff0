//! Core domain logic for WeightLog.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod dates;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transfer;
pub mod validation;

pub use config::CoreConfig;
pub use dates::{format_date, DateNormalizer};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::cell::{CellValue, RawImportRow};
pub use model::journal::{JournalEntry, StoredJournal};
pub use model::weight::{
    ChartSeries, Period, StoredWeight, WeightSample, WeightStatistics, WeightValidationError,
};
pub use repo::snapshot_repo::BulkReplaceReport;
pub use repo::{RepoError, RepoResult, UpsertOutcome};
pub use service::record_store::{RecordStore, StoreError, StoreResult};
pub use transfer::{
    default_export_path, file_locations, ExportDirectoryResolver, ExportResult,
    FallbackExportDirectory, FileLocations, ImportExportReconciler, ImportResult,
    TransferCapabilities, TransferError,
};
pub use validation::{RecordValidator, RejectionReason, ValidationOutcome};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
