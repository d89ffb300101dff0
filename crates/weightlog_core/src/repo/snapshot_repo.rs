//! Whole-store replacement used by spreadsheet imports.
//!
//! # Responsibility
//! - Swap both tables for a new snapshot inside one transaction.
//!
//! # Invariants
//! - Delete-all and insert-all share one transaction.
//! - Each row insert runs under its own savepoint; a rejected insert becomes
//!   a warning and the rest still commit.
//! - Any failure to begin, clear or commit rolls back to the previous
//!   snapshot with zero rows changed.

use crate::dates::format_date;
use crate::model::journal::JournalEntry;
use crate::model::weight::WeightSample;
use crate::repo::RepoResult;
use log::{info, warn};
use rusqlite::{params, Connection, ToSql, Transaction, TransactionBehavior};
use serde::Serialize;

/// Outcome of a committed bulk replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReplaceReport {
    pub weights_inserted: usize,
    pub journals_inserted: usize,
    /// One line per skipped row.
    pub warnings: Vec<String>,
}

/// Replaces every weight sample and journal entry with the given rows.
pub fn replace_all(
    conn: &mut Connection,
    weights: &[WeightSample],
    journals: &[JournalEntry],
) -> RepoResult<BulkReplaceReport> {
    let mut tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute("DELETE FROM weight_samples;", [])?;
    tx.execute("DELETE FROM journal_entries;", [])?;

    let mut report = BulkReplaceReport::default();

    for sample in weights {
        let date_text = format_date(sample.sample_date);
        if let Err(err) = sample.validate() {
            report.warnings.push(format!(
                "weight {date_text} {} skipped: {err}",
                sample.period
            ));
            continue;
        }

        match insert_in_savepoint(
            &mut tx,
            "INSERT INTO weight_samples (date, period, value) VALUES (?1, ?2, ?3);",
            params![date_text, sample.period.code(), sample.value],
        )? {
            Ok(()) => report.weights_inserted += 1,
            Err(err) => report.warnings.push(format!(
                "weight {date_text} {} skipped: {err}",
                sample.period
            )),
        }
    }

    for entry in journals {
        let date_text = format_date(entry.entry_date);
        match insert_in_savepoint(
            &mut tx,
            "INSERT INTO journal_entries (date, food, thoughts) VALUES (?1, ?2, ?3);",
            params![date_text, entry.food_text, entry.thoughts_text],
        )? {
            Ok(()) => report.journals_inserted += 1,
            Err(err) => report
                .warnings
                .push(format!("journal {date_text} skipped: {err}")),
        }
    }

    tx.commit()?;

    if !report.warnings.is_empty() {
        warn!(
            "event=bulk_replace module=repo status=partial skipped={}",
            report.warnings.len()
        );
    }
    info!(
        "event=bulk_replace module=repo status=ok weights={} journals={}",
        report.weights_inserted, report.journals_inserted
    );
    Ok(report)
}

/// Runs one insert under a savepoint.
///
/// The outer `Result` carries savepoint failures, which abort the whole
/// replace. The inner one carries the row's own insert failure.
fn insert_in_savepoint(
    tx: &mut Transaction<'_>,
    sql: &str,
    params: &[&dyn ToSql],
) -> RepoResult<Result<(), rusqlite::Error>> {
    let savepoint = tx.savepoint()?;
    match savepoint.execute(sql, params) {
        Ok(_) => {
            savepoint.commit()?;
            Ok(Ok(()))
        }
        // Dropping the savepoint rolls the failed row back.
        Err(err) => Ok(Err(err)),
    }
}
