//! Runtime configuration resolved from the process environment.
//!
//! # Responsibility
//! - Locate the database file and the export directory candidates.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - Resolution never fails; missing values fall back to defaults.

use std::ffi::OsString;
use std::path::PathBuf;

/// Overrides the database file location.
pub const DB_PATH_ENV: &str = "WEIGHTLOG_DB_PATH";
/// App data directory, first export directory candidate.
pub const DATA_DIR_ENV: &str = "WEIGHTLOG_DATA_DIR";
/// Explicit export directory, bypassing candidate probing.
pub const EXPORT_DIR_ENV: &str = "WEIGHTLOG_EXPORT_DIR";

pub const DEFAULT_DB_FILE_NAME: &str = "weight_data.sqlite3";

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub data_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Reads configuration from the current process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let path_var = |key: &str| {
            lookup(key)
                .filter(|value| !value.to_string_lossy().trim().is_empty())
                .map(PathBuf::from)
        };

        Self {
            db_path: path_var(DB_PATH_ENV)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            data_dir: path_var(DATA_DIR_ENV),
            export_dir: path_var(EXPORT_DIR_ENV),
            home_dir: path_var("HOME").or_else(|| path_var("USERPROFILE")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DEFAULT_DB_FILE_NAME};
    use std::collections::HashMap;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map = vars
            .iter()
            .map(|(key, value)| (key.to_string(), OsString::from(value)))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_temp_db_path() {
        let config = CoreConfig::from_lookup(lookup(&[]));
        assert_eq!(config.db_path, std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        assert_eq!(config.data_dir, None);
        assert_eq!(config.export_dir, None);
        assert_eq!(config.home_dir, None);
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("WEIGHTLOG_DB_PATH", "  "),
            ("WEIGHTLOG_EXPORT_DIR", "/srv/exports"),
            ("USERPROFILE", "/users/someone"),
        ]));
        assert_eq!(config.db_path, std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        assert_eq!(config.export_dir, Some(PathBuf::from("/srv/exports")));
        assert_eq!(config.home_dir, Some(PathBuf::from("/users/someone")));
    }
}
