//! funcscan CLI - extract every function of a JavaScript/TypeScript codebase
//! and hand the report to an inference service

mod progress;

use anyhow::Context;
use clap::{ArgAction, Parser};
use funcscan_core::config::{self, InferenceTarget, ResolvedConfig};
use funcscan_core::dispatch::Dispatcher;
use funcscan_core::{
    deliver, plan_scan, store_report, FunctionOrder, Report, ReportAssembler, RunError,
    ScanOptions, ScanRequest,
};
use progress::ScanProgress;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "funcscan")]
#[command(
    about = "Extract every function from JavaScript/TypeScript sources and send the report to an inference service"
)]
#[command(version = env!("FUNCSCAN_VERSION"))]
struct Cli {
    /// Files or directories to scan (files are always included)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Report destination (default: result.json)
    #[arg(short = 'o', long = "output-file")]
    output_file: Option<PathBuf>,

    /// Path to config file (default: auto-discover in the first path)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Inference service URL (default: http://localhost:5000)
    #[arg(long, conflicts_with = "command")]
    endpoint: Option<String>,

    /// Run a local program instead of calling the service
    #[arg(long)]
    command: Option<String>,

    /// Argument for --command; `{input}` is replaced by the report path
    #[arg(long = "arg", requires = "command", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Inference timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Only write the report, skip inference
    #[arg(long, conflicts_with_all = ["endpoint", "command"])]
    no_inference: bool,

    /// Keep functions in traversal order instead of sorting by line
    #[arg(long)]
    traversal_order: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_config(&cli)?;
    if let Some(ref config_path) = config.config_path {
        eprintln!("Using config: {}", config_path.display());
    }

    let request = ScanRequest::new(cli.paths.clone(), Some(config.output.clone()))?;
    let options = ScanOptions::from(&config);
    let report = extract(&request, &options)?;

    if cli.no_inference {
        let report_path = store_report(&report, request.destination())?;
        eprintln!("Report written to: {}", report_path.display());
        return Ok(());
    }

    let dispatcher = Dispatcher::from_target(&config.inference, config.timeout)?;
    let outcome = deliver(&report, request.destination(), &dispatcher)
        .await
        .map_err(|e| match e {
            RunError::Dispatch(source) => anyhow::Error::new(source).context(format!(
                "could not run inference for {}",
                request.destination().display()
            )),
            other => other.into(),
        })?;

    eprintln!("Report written to: {}", outcome.report_path.display());
    println!("{}", outcome.inference);
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Directory searched for a config file
fn config_root(paths: &[PathBuf]) -> PathBuf {
    match paths.first() {
        Some(path) if path.is_dir() => path.clone(),
        Some(path) => match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
        None => PathBuf::from("."),
    }
}

/// Load the config file and apply command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<ResolvedConfig> {
    let root = config_root(&cli.paths);
    let mut resolved = config::load_and_resolve(&root, cli.config.as_deref())?;
    apply_overrides(&mut resolved, cli)?;
    Ok(resolved)
}

fn apply_overrides(resolved: &mut ResolvedConfig, cli: &Cli) -> anyhow::Result<()> {
    if let Some(ref output) = cli.output_file {
        resolved.output = output.clone();
    }
    if let Some(ref endpoint) = cli.endpoint {
        config::validate_endpoint(endpoint).context("invalid --endpoint")?;
        resolved.inference = InferenceTarget::Http {
            endpoint: endpoint.clone(),
        };
    }
    if let Some(ref program) = cli.command {
        if program.trim().is_empty() {
            anyhow::bail!("--command must name a program");
        }
        resolved.inference = InferenceTarget::Command {
            program: program.clone(),
            args: cli.args.clone(),
        };
    }
    if let Some(secs) = cli.timeout {
        resolved.timeout = Some(Duration::from_secs(secs));
    }
    if cli.traversal_order {
        resolved.order = FunctionOrder::Traversal;
    }
    Ok(())
}

/// Discover and analyze every file, with a progress bar on large scans
fn extract(request: &ScanRequest, options: &ScanOptions) -> anyhow::Result<Report> {
    let files = plan_scan(request, options);
    tracing::info!(files = files.len(), "discovered files");

    let mut assembler = ReportAssembler::new(options.order)?;
    let is_ci = std::env::var_os("CI").is_some();
    let progress = ScanProgress::new(files.len(), std::io::stderr().is_terminal(), is_ci);
    for file in &files {
        assembler.add_file(file);
        progress.inc();
    }
    progress.finish();

    let report = assembler.finish();
    if report.is_empty() {
        tracing::warn!(
            roots = request.roots().len(),
            "no functions found in the scanned paths"
        );
    }
    Ok(report)
}
