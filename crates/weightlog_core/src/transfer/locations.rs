//! Where the app keeps its files, for a diagnostics screen.

use crate::transfer::export_dir::ExportDirectoryResolver;
use crate::transfer::reconciler::default_export_path;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Database and default export file, with size and age when present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileLocations {
    pub db_path: PathBuf,
    pub db_size: Option<u64>,
    pub export_path: Option<PathBuf>,
    pub export_size: Option<u64>,
    pub export_modified: Option<DateTime<Local>>,
}

impl FileLocations {
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Database: {} ({})",
            self.db_path.display(),
            describe_size(self.db_size)
        )];
        match &self.export_path {
            Some(path) => {
                lines.push(format!(
                    "Export file: {} ({})",
                    path.display(),
                    describe_size(self.export_size)
                ));
                if let Some(modified) = self.export_modified {
                    lines.push(format!(
                        "Last export: {}",
                        modified.format("%Y-%m-%d %H:%M:%S")
                    ));
                }
            }
            None => lines.push("Export file: no writable directory".to_string()),
        }
        lines.join("\n")
    }
}

/// Collects the current file locations.
pub fn file_locations(db_path: &Path, resolver: &impl ExportDirectoryResolver) -> FileLocations {
    let db_size = std::fs::metadata(db_path).ok().map(|meta| meta.len());
    let export_path = default_export_path(resolver);
    let export_meta = export_path
        .as_deref()
        .and_then(|path| std::fs::metadata(path).ok());

    FileLocations {
        db_path: db_path.to_path_buf(),
        db_size,
        export_path,
        export_size: export_meta.as_ref().map(|meta| meta.len()),
        export_modified: export_meta
            .and_then(|meta| meta.modified().ok())
            .map(DateTime::<Local>::from),
    }
}

fn describe_size(size: Option<u64>) -> String {
    match size {
        Some(bytes) => format!("{bytes} bytes"),
        None => "not created yet".to_string(),
    }
}
