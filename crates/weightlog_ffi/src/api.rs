//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Translate core results into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call returns a definite envelope; failures set `ok=false` and a
//!   human-readable `message`.
//! - Dates cross the boundary as canonical `YYYY/MM/DD` strings.

use log::error;
use std::path::PathBuf;
use std::sync::OnceLock;
use weightlog_core::{
    core_version as core_version_inner, default_export_path,
    file_locations as file_locations_inner, format_date, init_logging as init_logging_inner,
    ping as ping_inner, CoreConfig, DateNormalizer, FallbackExportDirectory,
    ImportExportReconciler, JournalEntry, Period, RecordStore, StoredJournal, StoredWeight,
    TransferCapabilities, TransferError, WeightSample,
};

const DEFAULT_RECENT_DAYS: u32 = 7;
const MAX_RECENT_DAYS: u32 = 365;
const DEFAULT_CHART_DAYS: u32 = 7;
const DEFAULT_JOURNAL_COUNT: u32 = 10;
static CORE_CONFIG: OnceLock<CoreConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// One weight sample as shown in lists.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightItem {
    pub date: String,
    /// `morning|evening`.
    pub period: String,
    /// Localized period label for display.
    pub period_label: String,
    pub value: f64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightListResponse {
    pub ok: bool,
    pub items: Vec<WeightItem>,
    pub message: String,
}

/// Aggregate statistics; numeric fields are zero when `has_data=false`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsResponse {
    pub ok: bool,
    pub has_data: bool,
    pub initial: f64,
    pub lightest: f64,
    pub heaviest: f64,
    pub average: f64,
    pub range: f64,
    pub sample_count: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartResponse {
    pub ok: bool,
    pub morning_series: Vec<f64>,
    pub evening_series: Vec<f64>,
    pub labels: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalItem {
    pub date: String,
    pub food: String,
    pub thoughts: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalResponse {
    pub ok: bool,
    /// `None` when no entry exists for the day.
    pub entry: Option<JournalItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalListResponse {
    pub ok: bool,
    pub items: Vec<JournalItem>,
    pub message: String,
}

/// Import/export response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResponse {
    pub ok: bool,
    /// File written or read.
    pub path: Option<String>,
    pub weight_count: u32,
    pub journal_count: u32,
    /// Per-row warnings, also on failure when no row was importable.
    pub warnings: Vec<String>,
    /// Multi-line digest for a result dialog.
    pub message: String,
}

impl TransferResponse {
    fn failure(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            path: path.map(|path| path.display().to_string()),
            weight_count: 0,
            journal_count: 0,
            warnings: Vec::new(),
            message: message.into(),
        }
    }
}

/// Records one weight sample; re-recording the same day and period
/// overwrites it.
///
/// Input semantics:
/// - `date`: any supported date shape; unparseable input means today.
/// - `period`: `早晨|晚上|morning|evening`.
/// - `value`: weight in jin, `20..=400`.
#[flutter_rust_bridge::frb(sync)]
pub fn record_weight(date: String, period: String, value: f64) -> ActionResponse {
    let Some(period) = Period::from_label(period.trim()) else {
        return ActionResponse::failure("record_weight failed: unknown period");
    };
    let sample_date = DateNormalizer::new().parse(&date);
    let sample = match WeightSample::new(sample_date, period, value) {
        Ok(sample) => sample,
        Err(err) => return ActionResponse::failure(call_failed("record_weight", &err)),
    };

    match store().upsert_weight(&sample) {
        Ok(_) => ActionResponse::success(format!(
            "Saved {} {} weight.",
            format_date(sample_date),
            period.localized_label()
        )),
        Err(err) => ActionResponse::failure(call_failed("record_weight", &err)),
    }
}

/// Saves the journal entry of one day, replacing any earlier text.
#[flutter_rust_bridge::frb(sync)]
pub fn save_journal(date: String, food: String, thoughts: String) -> ActionResponse {
    let entry_date = DateNormalizer::new().parse(&date);
    let entry = JournalEntry::new(entry_date, food.trim(), thoughts.trim());
    match store().upsert_journal(&entry) {
        Ok(_) => ActionResponse::success(format!("Saved journal for {}.", format_date(entry_date))),
        Err(err) => ActionResponse::failure(call_failed("save_journal", &err)),
    }
}

/// Lists samples of the last `days` days (default 7), newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn recent_weights(days: Option<u32>) -> WeightListResponse {
    let days = normalize_days(days, DEFAULT_RECENT_DAYS);
    match store().get_recent_weights(days) {
        Ok(rows) => WeightListResponse {
            ok: true,
            message: format!("Found {} record(s).", rows.len()),
            items: rows.into_iter().map(to_weight_item).collect(),
        },
        Err(err) => WeightListResponse {
            ok: false,
            items: Vec::new(),
            message: call_failed("recent_weights", &err),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn weight_statistics() -> StatisticsResponse {
    let mut response = StatisticsResponse {
        ok: true,
        has_data: false,
        initial: 0.0,
        lightest: 0.0,
        heaviest: 0.0,
        average: 0.0,
        range: 0.0,
        sample_count: 0,
        message: "No data yet.".to_string(),
    };
    match store().get_statistics() {
        Ok(Some(stats)) => {
            response.has_data = true;
            response.initial = stats.initial;
            response.lightest = stats.lightest;
            response.heaviest = stats.heaviest;
            response.average = stats.average;
            response.range = stats.range;
            response.sample_count = stats.sample_count;
            response.message = format!("{} sample(s).", stats.sample_count);
        }
        Ok(None) => {}
        Err(err) => {
            response.ok = false;
            response.message = call_failed("weight_statistics", &err);
        }
    }
    response
}

/// Chart series over the last `days` recorded dates (default 7).
#[flutter_rust_bridge::frb(sync)]
pub fn chart_series(days: Option<u32>) -> ChartResponse {
    let days = normalize_days(days, DEFAULT_CHART_DAYS);
    match store().get_chart_series(days) {
        Ok(series) => ChartResponse {
            ok: true,
            message: if series.is_empty() {
                "No data yet.".to_string()
            } else {
                format!("{} day(s).", series.labels.len())
            },
            morning_series: series.morning_series,
            evening_series: series.evening_series,
            labels: series.labels,
        },
        Err(err) => ChartResponse {
            ok: false,
            morning_series: Vec::new(),
            evening_series: Vec::new(),
            labels: Vec::new(),
            message: call_failed("chart_series", &err),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn today_journal() -> JournalResponse {
    match store().get_today_journal() {
        Ok(entry) => JournalResponse {
            ok: true,
            message: if entry.is_some() {
                "Found today's journal.".to_string()
            } else {
                "No journal for today.".to_string()
            },
            entry: entry.map(to_journal_item),
        },
        Err(err) => JournalResponse {
            ok: false,
            entry: None,
            message: call_failed("today_journal", &err),
        },
    }
}

/// Latest `count` journal entries (default 10), newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn recent_journal(count: Option<u32>) -> JournalListResponse {
    let count = normalize_days(count, DEFAULT_JOURNAL_COUNT);
    match store().get_recent_journal(count) {
        Ok(entries) => JournalListResponse {
            ok: true,
            message: format!("Found {} entr(ies).", entries.len()),
            items: entries.into_iter().map(to_journal_item).collect(),
        },
        Err(err) => JournalListResponse {
            ok: false,
            items: Vec::new(),
            message: call_failed("recent_journal", &err),
        },
    }
}

/// Exports every record to `destination`, or to the default export file.
#[flutter_rust_bridge::frb(sync)]
pub fn export_data(destination: Option<String>) -> TransferResponse {
    let Some(destination) = resolve_transfer_path(destination) else {
        return TransferResponse::failure(None, "export_data failed: no writable export directory");
    };

    let reconciler = ImportExportReconciler::xlsx(TransferCapabilities::default());
    match reconciler.export_store(&store(), &destination) {
        Ok(result) => TransferResponse {
            ok: true,
            path: Some(result.path.display().to_string()),
            weight_count: result.weight_rows as u32,
            journal_count: result.journal_rows as u32,
            warnings: Vec::new(),
            message: result.summary(),
        },
        Err(err) => TransferResponse::failure(Some(destination), call_failed("export_data", &err)),
    }
}

/// Replaces all records with the contents of `source`, or of the default
/// export file.
#[flutter_rust_bridge::frb(sync)]
pub fn import_data(source: Option<String>) -> TransferResponse {
    let Some(source) = resolve_transfer_path(source) else {
        return TransferResponse::failure(None, "import_data failed: no export directory");
    };

    let reconciler = ImportExportReconciler::xlsx(TransferCapabilities::default());
    match reconciler.import(&source, &store()) {
        Ok(result) => TransferResponse {
            ok: true,
            path: Some(source.display().to_string()),
            weight_count: result.accepted_weight_count as u32,
            journal_count: result.accepted_journal_count as u32,
            message: result.summary(),
            warnings: result.warnings,
        },
        Err(TransferError::NothingToImport { warnings }) => TransferResponse {
            message: format!(
                "import_data failed: no valid rows to import ({} row(s) rejected)",
                warnings.len()
            ),
            warnings,
            ..TransferResponse::failure(Some(source), String::new())
        },
        Err(err) => TransferResponse::failure(Some(source), call_failed("import_data", &err)),
    }
}

/// Human-readable report of the database and export file locations.
#[flutter_rust_bridge::frb(sync)]
pub fn file_locations() -> String {
    let config = core_config();
    file_locations_inner(&config.db_path, &FallbackExportDirectory::from_config(config)).summary()
}

/// Logs a failed call without its payload and renders the UI message.
fn call_failed(op: &str, err: &dyn std::fmt::Display) -> String {
    error!("event=ffi_call module=ffi status=error op={op}");
    format!("{op} failed: {err}")
}

fn core_config() -> &'static CoreConfig {
    CORE_CONFIG.get_or_init(load_core_config)
}

#[cfg(not(test))]
fn load_core_config() -> CoreConfig {
    CoreConfig::from_env()
}

#[cfg(test)]
fn load_core_config() -> CoreConfig {
    tests::scratch_config()
}

fn store() -> RecordStore {
    RecordStore::new(core_config().db_path.clone())
}

fn resolve_transfer_path(explicit: Option<String>) -> Option<PathBuf> {
    match explicit.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => default_export_path(&FallbackExportDirectory::from_config(core_config())),
    }
}

fn normalize_days(value: Option<u32>, default: u32) -> u32 {
    match value {
        None | Some(0) => default,
        Some(value) => value.min(MAX_RECENT_DAYS),
    }
}

fn to_weight_item(stored: StoredWeight) -> WeightItem {
    WeightItem {
        date: format_date(stored.sample.sample_date),
        period: stored.sample.period.code().to_string(),
        period_label: stored.sample.period.localized_label().to_string(),
        value: stored.sample.value,
        updated_at: stored.updated_at,
    }
}

fn to_journal_item(stored: StoredJournal) -> JournalItem {
    JournalItem {
        date: format_date(stored.entry.entry_date),
        food: stored.entry.food_text,
        thoughts: stored.entry.thoughts_text,
        updated_at: stored.updated_at,
    }
}
