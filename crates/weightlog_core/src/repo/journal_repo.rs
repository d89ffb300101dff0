//! Journal entry repository contracts and SQLite implementation.
//!
//! # Invariants
//! - At most one entry per date; saving the same date overwrites it.
//! - Lookup and write of one upsert share an IMMEDIATE transaction.

use crate::dates::format_date;
use crate::model::journal::{JournalEntry, StoredJournal};
use crate::repo::{parse_stored_date, RepoResult, UpsertOutcome};
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const JOURNAL_SELECT_SQL: &str = "SELECT
    date,
    food,
    thoughts,
    updated_at
FROM journal_entries";

/// Repository interface for journal entries.
pub trait JournalRepository {
    /// Inserts or overwrites the entry for `entry_date`.
    fn upsert_journal(&mut self, entry: &JournalEntry) -> RepoResult<UpsertOutcome>;
    fn get_journal(&self, date: NaiveDate) -> RepoResult<Option<StoredJournal>>;
    /// Returns at most `count` entries, most recent first.
    fn list_recent_journal(&self, count: u32) -> RepoResult<Vec<StoredJournal>>;
    /// Returns every entry in chronological order.
    fn list_all_journal(&self) -> RepoResult<Vec<StoredJournal>>;
    fn count_journal(&self) -> RepoResult<u64>;
}

/// SQLite-backed journal repository.
pub struct SqliteJournalRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteJournalRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn upsert_journal(&mut self, entry: &JournalEntry) -> RepoResult<UpsertOutcome> {
        let date_text = format_date(entry.entry_date);
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM journal_entries WHERE date = ?1;",
                [date_text.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE journal_entries
                     SET
                        food = ?1,
                        thoughts = ?2,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?3;",
                    params![entry.food_text, entry.thoughts_text, id],
                )?;
                UpsertOutcome::Updated
            }
            None => {
                tx.execute(
                    "INSERT INTO journal_entries (date, food, thoughts) VALUES (?1, ?2, ?3);",
                    params![date_text, entry.food_text, entry.thoughts_text],
                )?;
                UpsertOutcome::Inserted
            }
        };
        tx.commit()?;

        info!(
            "event=journal_upsert module=repo status=ok outcome={:?} food_len={} thoughts_len={}",
            outcome,
            entry.food_text.chars().count(),
            entry.thoughts_text.chars().count()
        );
        Ok(outcome)
    }

    fn get_journal(&self, date: NaiveDate) -> RepoResult<Option<StoredJournal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{JOURNAL_SELECT_SQL} WHERE date = ?1;"))?;
        let mut rows = stmt.query([format_date(date)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_journal_row(row)?));
        }
        Ok(None)
    }

    fn list_recent_journal(&self, count: u32) -> RepoResult<Vec<StoredJournal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{JOURNAL_SELECT_SQL} ORDER BY date DESC LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([i64::from(count)])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_journal_row(row)?);
        }
        Ok(entries)
    }

    fn list_all_journal(&self) -> RepoResult<Vec<StoredJournal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{JOURNAL_SELECT_SQL} ORDER BY date ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_journal_row(row)?);
        }
        Ok(entries)
    }

    fn count_journal(&self) -> RepoResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM journal_entries;", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn parse_journal_row(row: &Row<'_>) -> RepoResult<StoredJournal> {
    let date_text: String = row.get("date")?;
    let entry_date = parse_stored_date(&date_text, "journal_entries.date")?;
    let food: Option<String> = row.get("food")?;
    let thoughts: Option<String> = row.get("thoughts")?;

    Ok(StoredJournal {
        entry: JournalEntry {
            entry_date,
            food_text: food.unwrap_or_default(),
            thoughts_text: thoughts.unwrap_or_default(),
        },
        updated_at: row.get("updated_at")?,
    })
}
