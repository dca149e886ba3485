//! funcscan core library - function extraction for JavaScript and TypeScript

// Global invariants enforced in this crate:
// - Parsing never fails; malformed input yields a partial tree
// - Discovery, parsing and extraction run sequentially, root by root
// - Files contributing no functions never reach the report
// - The report is persisted before it is dispatched
// - Dispatch happens at most once per run, without retry

pub mod analysis;
pub mod ast;
pub mod config;
pub mod discover;
pub mod dispatch;
pub mod extract;
pub mod ignore;
pub mod language;
pub mod parser;
pub mod printer;
pub mod report;

pub use analysis::ReportAssembler;
pub use config::ResolvedConfig;
pub use dispatch::{DispatchError, InferenceDispatcher, InferenceResult};
pub use extract::{ExtractedFunction, FunctionOrder};
pub use report::{render_json, store_report, FileReport, Report};

use language::Language;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal errors of a scan run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("invalid scan request: {0}")]
    InvalidRequest(String),
    #[error("could not load the {language} grammar")]
    Parser {
        language: Language,
        #[source]
        source: tree_sitter::LanguageError,
    },
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write report to {}", .destination.display())]
    Store {
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Roots to scan and where to persist the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    roots: Vec<PathBuf>,
    destination: PathBuf,
}

impl ScanRequest {
    /// Create a request; at least one root is required
    ///
    /// The destination defaults to `result.json`.
    pub fn new(roots: Vec<PathBuf>, destination: Option<PathBuf>) -> Result<Self, RunError> {
        if roots.is_empty() {
            return Err(RunError::InvalidRequest(
                "at least one path to scan is required".to_string(),
            ));
        }
        Ok(ScanRequest {
            roots,
            destination: destination.unwrap_or_else(|| PathBuf::from(config::DEFAULT_OUTPUT)),
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Options shared by every root of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Extra exclude globs on top of the built-ins and ignore files
    pub exclude: Vec<String>,
    pub order: FunctionOrder,
}

impl From<&ResolvedConfig> for ScanOptions {
    fn from(config: &ResolvedConfig) -> Self {
        ScanOptions {
            exclude: config.exclude.clone(),
            order: config.order,
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Absolute path of the persisted report
    pub report_path: PathBuf,
    /// Files with at least one function
    pub files: usize,
    pub functions: usize,
    pub inference: InferenceResult,
}

/// List every file to analyze, root by root in request order
///
/// Each root gets its own ignore rules. A root that cannot be scanned
/// contributes nothing and does not stop the others.
pub fn plan_scan(request: &ScanRequest, options: &ScanOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in request.roots() {
        let rules = ignore::resolve(root, &options.exclude);
        files.extend(discover::discover_files(root, &rules));
    }
    files
}

/// Discover, parse and extract every file into a report
pub fn build_report(request: &ScanRequest, options: &ScanOptions) -> Result<Report, RunError> {
    let mut assembler = ReportAssembler::new(options.order)?;
    for file in plan_scan(request, options) {
        assembler.add_file(&file);
    }
    Ok(assembler.finish())
}

/// Persist a report and hand it to the dispatcher
///
/// Nothing is dispatched if the report cannot be stored.
pub async fn deliver<D: InferenceDispatcher>(
    report: &Report,
    destination: &Path,
    dispatcher: &D,
) -> Result<RunOutcome, RunError> {
    let report_path = store_report(report, destination)?;
    let inference = dispatcher.dispatch(&report_path).await?;
    tracing::info!(report = %report_path.display(), "inference finished");

    Ok(RunOutcome {
        report_path,
        files: report.len(),
        functions: report.function_count(),
        inference,
    })
}

/// Run a whole scan: build the report, persist it, dispatch it
pub async fn run<D: InferenceDispatcher>(
    request: &ScanRequest,
    options: &ScanOptions,
    dispatcher: &D,
) -> Result<RunOutcome, RunError> {
    let report = build_report(request, options)?;
    tracing::info!(
        files = report.len(),
        functions = report.function_count(),
        "extraction finished"
    );
    deliver(&report, request.destination(), dispatcher).await
}
