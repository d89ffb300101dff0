//! Domain model for the weight journal.
//!
//! # Responsibility
//! - Define canonical records persisted by the store.
//! - Define the untyped cell shape read from external spreadsheets.
//!
//! # Invariants
//! - A `WeightSample` is identified by `(sample_date, period)`.
//! - A `JournalEntry` is identified by `entry_date`.
//! - Period codes are internal (`morning|evening`); localized labels exist
//!   only at the import/export boundary.

pub mod cell;
pub mod journal;
pub mod weight;
