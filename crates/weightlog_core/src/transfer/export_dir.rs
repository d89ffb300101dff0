//! Export directory selection.
//!
//! # Invariants
//! - An explicit export directory, when configured and writable, wins.
//! - Otherwise candidates are tried in order: app data dir, `~/Documents`,
//!   `~`, current directory.
//! - Each candidate first gets an export subdirectory; when that is not
//!   writable the candidate itself is used if writable.

use crate::config::CoreConfig;
use log::{info, warn};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const EXPORT_SUBDIRECTORY: &str = "weight_data_exports";
const WRITE_PROBE_FILE_NAME: &str = "permission_test.tmp";

/// Chooses where exported workbooks go.
pub trait ExportDirectoryResolver {
    /// `None` when no writable directory is available.
    fn resolve_export_directory(&self) -> Option<PathBuf>;
}

/// Ordered candidate list with a write probe per directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackExportDirectory {
    explicit: Option<PathBuf>,
    candidates: Vec<PathBuf>,
}

impl FallbackExportDirectory {
    pub fn new(explicit: Option<PathBuf>, candidates: Vec<PathBuf>) -> Self {
        Self {
            explicit,
            candidates,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        let mut candidates = Vec::new();
        candidates.extend(config.data_dir.clone());
        if let Some(home) = &config.home_dir {
            candidates.push(home.join("Documents"));
            candidates.push(home.clone());
        }
        candidates.extend(std::env::current_dir().ok());
        Self::new(config.export_dir.clone(), candidates)
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }
}

impl ExportDirectoryResolver for FallbackExportDirectory {
    fn resolve_export_directory(&self) -> Option<PathBuf> {
        if let Some(explicit) = &self.explicit {
            if std::fs::create_dir_all(explicit).is_ok() && is_writable(explicit) {
                info!("event=export_dir module=transfer status=ok source=explicit");
                return Some(explicit.clone());
            }
            warn!("event=export_dir module=transfer status=fallback source=explicit");
        }

        for (idx, base) in self.candidates.iter().enumerate() {
            if let Some(dir) = resolve_candidate(base) {
                info!("event=export_dir module=transfer status=ok candidate={idx}");
                return Some(dir);
            }
            warn!("event=export_dir module=transfer status=skip candidate={idx}");
        }
        None
    }
}

fn resolve_candidate(base: &Path) -> Option<PathBuf> {
    if base.as_os_str().is_empty() {
        return None;
    }

    let export_dir = base.join(EXPORT_SUBDIRECTORY);
    if std::fs::create_dir_all(&export_dir).is_ok() && is_writable(&export_dir) {
        return Some(export_dir);
    }
    is_writable(base).then(|| base.to_path_buf())
}

/// Writes and removes a probe file.
fn is_writable(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    let probe = dir.join(WRITE_PROBE_FILE_NAME);
    let written = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)
        .and_then(|mut file| file.write_all(b"ok"));
    let _ = std::fs::remove_file(&probe);
    written.is_ok()
}
