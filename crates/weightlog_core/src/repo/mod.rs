//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for weights and journal.
//! - Isolate SQLite query details from service/business orchestration.
//! - Own the cross-table bulk replace used by imports.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Dates are stored as canonical `YYYY/MM/DD` text so that lexical order is
//!   chronological order.

use crate::dates::{DateNormalizer, CANONICAL_DATE_FORMAT};
use crate::db::DbError;
use crate::model::weight::WeightValidationError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod journal_repo;
pub mod snapshot_repo;
pub mod weight_repo;

/// `ORDER BY` fragment placing morning before evening.
pub(crate) const PERIOD_ORDER_SQL: &str = "CASE period WHEN 'morning' THEN 0 ELSE 1 END";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(WeightValidationError),
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    /// Returns `true` when the failure came from a dropped/missing table.
    pub fn is_missing_table(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_missing_table())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<WeightValidationError> for RepoError {
    fn from(value: WeightValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Whether an upsert created a new row or rewrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Decodes a persisted date column.
///
/// Canonical text is expected; legacy rows in any other supported shape are
/// still accepted through the strict normalizer.
pub(crate) fn parse_stored_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, CANONICAL_DATE_FORMAT)
        .ok()
        .or_else(|| DateNormalizer::new().parse_strict(value))
        .ok_or_else(|| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}
