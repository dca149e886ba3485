//! Per-file reports and report persistence
//!
//! The persisted report is a pretty-printed JSON array:
//!
//! ```text
//! [{ "filePath": "...", "messages": [{ "functionBody": "...",
//!    "startLine": 1, "endLine": 3, "nodeType": "FunctionDeclaration" }] }]
//! ```

use crate::extract::ExtractedFunction;
use crate::RunError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Functions extracted from one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "messages")]
    pub functions: Vec<ExtractedFunction>,
}

impl FileReport {
    /// Wrap a file's functions; `None` when there are none
    pub fn new(path: &Path, functions: Vec<ExtractedFunction>) -> Option<Self> {
        if functions.is_empty() {
            return None;
        }
        Some(FileReport {
            file_path: path.display().to_string(),
            functions,
        })
    }
}

/// Ordered per-file reports of one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    files: Vec<FileReport>,
}

impl Report {
    pub fn new() -> Self {
        Report::default()
    }

    /// Append a file report, dropping it if it holds no functions
    pub fn push(&mut self, file: FileReport) {
        if !file.functions.is_empty() {
            self.files.push(file);
        }
    }

    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of functions across all files
    pub fn function_count(&self) -> usize {
        self.files.iter().map(|file| file.functions.len()).sum()
    }
}

/// Render a report as pretty-printed JSON
pub fn render_json(report: &Report) -> Result<String, RunError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Persist a report, returning its absolute path
///
/// Missing parent directories are created. The file is written to a
/// temporary sibling first and renamed into place.
pub fn store_report(report: &Report, destination: &Path) -> Result<PathBuf, RunError> {
    let json = render_json(report)?;
    let store_error = |source| RunError::Store {
        destination: destination.to_path_buf(),
        source,
    };

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(store_error)?;
        }
    }

    let temp_path = destination.with_extension("json.tmp");
    if let Err(e) = write_and_rename(&temp_path, destination, &json) {
        if temp_path.exists() {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                tracing::warn!(path = %temp_path.display(), error = %cleanup, "could not remove temporary report");
            }
        }
        return Err(store_error(e));
    }

    let stored = fs::canonicalize(destination).map_err(store_error)?;
    tracing::info!(
        path = %stored.display(),
        files = report.len(),
        functions = report.function_count(),
        "stored report"
    );
    Ok(stored)
}

fn write_and_rename(temp_path: &Path, destination: &Path, json: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, destination)
}
