//! Journal entry model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One diary entry per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_date: NaiveDate,
    /// What was eaten.
    pub food_text: String,
    /// Free-form reflections.
    pub thoughts_text: String,
}

impl JournalEntry {
    pub fn new(
        entry_date: NaiveDate,
        food_text: impl Into<String>,
        thoughts_text: impl Into<String>,
    ) -> Self {
        Self {
            entry_date,
            food_text: food_text.into(),
            thoughts_text: thoughts_text.into(),
        }
    }
}

/// Persisted journal row with its modification timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredJournal {
    pub entry: JournalEntry,
    /// Last write time in epoch milliseconds.
    pub updated_at: i64,
}
