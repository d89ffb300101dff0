//! Weight sample repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Upsert samples by natural key `(date, period)`.
//! - Serve ordered reads and aggregate statistics.
//!
//! # Invariants
//! - Lookup and write of one upsert run inside a single IMMEDIATE
//!   transaction.
//! - Recent reads are `date DESC`, then morning before evening.
//! - Full reads are `date ASC`, then morning before evening.

use crate::dates::format_date;
use crate::model::weight::{Period, StoredWeight, WeightSample, WeightStatistics};
use crate::repo::{parse_stored_date, RepoError, RepoResult, UpsertOutcome, PERIOD_ORDER_SQL};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const WEIGHT_SELECT_SQL: &str = "SELECT
    date,
    period,
    value,
    updated_at
FROM weight_samples";

/// Repository interface for weight samples.
pub trait WeightRepository {
    /// Inserts or rewrites the sample keyed by `(sample_date, period)`.
    fn upsert_weight(&mut self, sample: &WeightSample) -> RepoResult<UpsertOutcome>;
    /// Returns at most `days * 2` rows, most recent date first.
    fn list_recent_weights(&self, days: u32) -> RepoResult<Vec<StoredWeight>>;
    /// Returns every row in chronological order.
    fn list_all_weights(&self) -> RepoResult<Vec<StoredWeight>>;
    /// Returns `None` when no samples exist.
    fn weight_statistics(&self) -> RepoResult<Option<WeightStatistics>>;
    fn count_weights(&self) -> RepoResult<u64>;
}

/// SQLite-backed weight repository.
pub struct SqliteWeightRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteWeightRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl WeightRepository for SqliteWeightRepository<'_> {
    fn upsert_weight(&mut self, sample: &WeightSample) -> RepoResult<UpsertOutcome> {
        sample.validate()?;

        let date_text = format_date(sample.sample_date);
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM weight_samples WHERE date = ?1 AND period = ?2;",
                params![date_text, sample.period.code()],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE weight_samples
                     SET
                        value = ?1,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?2;",
                    params![sample.value, id],
                )?;
                UpsertOutcome::Updated
            }
            None => {
                tx.execute(
                    "INSERT INTO weight_samples (date, period, value) VALUES (?1, ?2, ?3);",
                    params![date_text, sample.period.code(), sample.value],
                )?;
                UpsertOutcome::Inserted
            }
        };
        tx.commit()?;

        info!(
            "event=weight_upsert module=repo status=ok period={} outcome={:?}",
            sample.period, outcome
        );
        Ok(outcome)
    }

    fn list_recent_weights(&self, days: u32) -> RepoResult<Vec<StoredWeight>> {
        let limit = i64::from(days) * 2;
        let mut stmt = self.conn.prepare(&format!(
            "{WEIGHT_SELECT_SQL}
             ORDER BY date DESC, {PERIOD_ORDER_SQL} ASC
             LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([limit])?;
        let mut samples = Vec::new();
        while let Some(row) = rows.next()? {
            samples.push(parse_weight_row(row)?);
        }
        Ok(samples)
    }

    fn list_all_weights(&self) -> RepoResult<Vec<StoredWeight>> {
        let mut stmt = self.conn.prepare(&format!(
            "{WEIGHT_SELECT_SQL}
             ORDER BY date ASC, {PERIOD_ORDER_SQL} ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut samples = Vec::new();
        while let Some(row) = rows.next()? {
            samples.push(parse_weight_row(row)?);
        }
        Ok(samples)
    }

    fn weight_statistics(&self) -> RepoResult<Option<WeightStatistics>> {
        let (count, lightest, heaviest, average): (i64, Option<f64>, Option<f64>, Option<f64>) =
            self.conn.query_row(
                "SELECT COUNT(*), MIN(value), MAX(value), AVG(value) FROM weight_samples;",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
        if count == 0 {
            return Ok(None);
        }

        let initial: f64 = self.conn.query_row(
            &format!(
                "SELECT value FROM weight_samples
                 ORDER BY date ASC, {PERIOD_ORDER_SQL} ASC, id ASC
                 LIMIT 1;"
            ),
            [],
            |row| row.get(0),
        )?;

        let (Some(lightest), Some(heaviest), Some(average)) = (lightest, heaviest, average) else {
            error!("event=weight_stats module=repo status=error error_code=null_aggregate");
            return Err(RepoError::InvalidData(
                "aggregate returned NULL for a non-empty weight_samples table".to_string(),
            ));
        };

        Ok(Some(WeightStatistics {
            initial,
            lightest,
            heaviest,
            average,
            range: heaviest - lightest,
            sample_count: count as u64,
        }))
    }

    fn count_weights(&self) -> RepoResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM weight_samples;", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn parse_weight_row(row: &Row<'_>) -> RepoResult<StoredWeight> {
    let date_text: String = row.get("date")?;
    let sample_date = parse_stored_date(&date_text, "weight_samples.date")?;

    let period_text: String = row.get("period")?;
    let period = Period::from_code(&period_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid period `{period_text}` in weight_samples.period"
        ))
    })?;

    let sample = WeightSample {
        sample_date,
        period,
        value: row.get("value")?,
    };
    sample.validate()?;

    Ok(StoredWeight {
        sample,
        updated_at: row.get("updated_at")?,
    })
}
