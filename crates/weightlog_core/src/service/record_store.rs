//! Record store facade.
//!
//! # Responsibility
//! - Expose weight and journal use-cases over a database file path.
//! - Scope one connection to one call: acquire, operate, release.
//! - Self-heal once when a table has gone missing underneath the schema
//!   version.
//!
//! # Invariants
//! - No call panics past this boundary; every failure is a `StoreError`.
//! - A missing-table failure triggers at most one schema repair and one
//!   retry per call.
//! - Bulk replace is all-or-nothing at the structural level.

use crate::dates::DateNormalizer;
use crate::db::migrations::repair_schema;
use crate::db::{open_db, DbError};
use crate::model::journal::{JournalEntry, StoredJournal};
use crate::model::weight::{ChartSeries, StoredWeight, WeightSample, WeightStatistics};
use crate::repo::journal_repo::{JournalRepository, SqliteJournalRepository};
use crate::repo::snapshot_repo::{replace_all, BulkReplaceReport};
use crate::repo::weight_repo::{SqliteWeightRepository, WeightRepository};
use crate::repo::{RepoError, RepoResult, UpsertOutcome};
use crate::service::chart::build_chart_series;
use chrono::NaiveDate;
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Error returned at the record store boundary.
#[derive(Debug)]
pub enum StoreError {
    /// Database could not be opened or bootstrapped.
    Open(DbError),
    /// Query or write failed after the connection was ready.
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(err) => write!(f, "failed to open record store: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent store for weight samples and journal entries.
#[derive(Debug, Clone)]
pub struct RecordStore {
    db_path: PathBuf,
    dates: DateNormalizer,
}

impl RecordStore {
    /// Creates a store over `db_path`. Nothing is opened until the first call.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            dates: DateNormalizer::new(),
        }
    }

    /// Replaces the notion of "today" used by `get_today_journal`.
    pub fn with_dates(mut self, dates: DateNormalizer) -> Self {
        self.dates = dates;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn upsert_weight(&self, sample: &WeightSample) -> StoreResult<UpsertOutcome> {
        self.run("upsert_weight", |conn| {
            SqliteWeightRepository::new(conn).upsert_weight(sample)
        })
    }

    pub fn upsert_journal(&self, entry: &JournalEntry) -> StoreResult<UpsertOutcome> {
        self.run("upsert_journal", |conn| {
            SqliteJournalRepository::new(conn).upsert_journal(entry)
        })
    }

    /// Samples of roughly the last `days` days, most recent first.
    pub fn get_recent_weights(&self, days: u32) -> StoreResult<Vec<StoredWeight>> {
        self.run("recent_weights", |conn| {
            SqliteWeightRepository::new(conn).list_recent_weights(days)
        })
    }

    pub fn get_all_weights(&self) -> StoreResult<Vec<StoredWeight>> {
        self.run("all_weights", |conn| {
            SqliteWeightRepository::new(conn).list_all_weights()
        })
    }

    pub fn get_statistics(&self) -> StoreResult<Option<WeightStatistics>> {
        self.run("weight_statistics", |conn| {
            SqliteWeightRepository::new(conn).weight_statistics()
        })
    }

    pub fn get_chart_series(&self, days: u32) -> StoreResult<ChartSeries> {
        let samples = self
            .get_all_weights()?
            .into_iter()
            .map(|stored| stored.sample)
            .collect::<Vec<_>>();
        Ok(build_chart_series(&samples, days))
    }

    /// Replaces both tables with the given rows in one transaction.
    pub fn bulk_replace(
        &self,
        weights: &[WeightSample],
        journals: &[JournalEntry],
    ) -> StoreResult<BulkReplaceReport> {
        self.run("bulk_replace", |conn| replace_all(conn, weights, journals))
    }

    pub fn get_journal(&self, date: NaiveDate) -> StoreResult<Option<StoredJournal>> {
        self.run("get_journal", |conn| {
            SqliteJournalRepository::new(conn).get_journal(date)
        })
    }

    pub fn get_today_journal(&self) -> StoreResult<Option<StoredJournal>> {
        self.get_journal(self.dates.today())
    }

    /// At most `count` entries, most recent first.
    pub fn get_recent_journal(&self, count: u32) -> StoreResult<Vec<StoredJournal>> {
        self.run("recent_journal", |conn| {
            SqliteJournalRepository::new(conn).list_recent_journal(count)
        })
    }

    pub fn get_all_journal(&self) -> StoreResult<Vec<StoredJournal>> {
        self.run("all_journal", |conn| {
            SqliteJournalRepository::new(conn).list_all_journal()
        })
    }

    pub fn count_weights(&self) -> StoreResult<u64> {
        self.run("count_weights", |conn| {
            SqliteWeightRepository::new(conn).count_weights()
        })
    }

    pub fn count_journal(&self) -> StoreResult<u64> {
        self.run("count_journal", |conn| {
            SqliteJournalRepository::new(conn).count_journal()
        })
    }

    fn run<T>(
        &self,
        op: &'static str,
        mut action: impl FnMut(&mut Connection) -> RepoResult<T>,
    ) -> StoreResult<T> {
        let mut conn = open_db(&self.db_path).map_err(StoreError::Open)?;

        match action(&mut conn) {
            Ok(value) => Ok(value),
            Err(err) if err.is_missing_table() => {
                warn!("event=schema_repair module=store status=start op={op}");
                if let Err(repair_err) = repair_schema(&mut conn) {
                    error!(
                        "event=schema_repair module=store status=error op={op} error={repair_err}"
                    );
                    return Err(StoreError::Repo(repair_err.into()));
                }
                info!("event=schema_repair module=store status=ok op={op}");
                action(&mut conn).map_err(|err| log_failure(op, err))
            }
            Err(err) => Err(log_failure(op, err)),
        }
    }
}

fn log_failure(op: &str, err: RepoError) -> StoreError {
    error!("event=store_call module=store status=error op={op} error={err}");
    StoreError::Repo(err)
}
