//! This module implements the CLI surface for archive-finder: argument parsing, output file
//! naming, the authentication and project checks, and the console summary.
//!
//! All scanning logic lives in the [`archive-finder-core`] crate; this module wires it to real
//! processes and files.
//!
//! ## How To Use
//! - For command-line users: `archive-finder --org-id <ID> [--output report.csv]`.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`], or [`execute`]
//!   with any [`CommandRunner`].
//!
//! [`archive-finder-core`]: ../../archive-finder-core/
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use archive_finder_core::command::ProcessRunner;
use archive_finder_core::config::{ContextMode, ScanConfig};
use archive_finder_core::contract::CommandRunner;
use archive_finder_core::error::{ScanError, REQUIRED_ROLES};
use archive_finder_core::gcloud::CloudCli;
use archive_finder_core::report::{CsvReport, DeniedFile};
use archive_finder_core::scan::Scanner;
use clap::Parser;
use serde::Serialize;

use crate::load_config::{load_config, FileConfig, Overrides};

/// CLI for archive-finder: search organization buckets for archive files.
#[derive(Parser, Debug)]
#[clap(
    name = "archive-finder",
    version,
    about = "Search for archive files in GCP organization buckets."
)]
pub struct Cli {
    /// Google Cloud Organization ID
    #[clap(long)]
    pub org_id: String,

    /// Output file path (optional)
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Where to list projects with permission issues (optional)
    #[clap(long)]
    pub errors_output: Option<PathBuf>,

    /// Path to a YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Number of projects scanned at once
    #[clap(long)]
    pub concurrency: Option<usize>,

    /// How commands are bound to a project: explicit or ambient
    #[clap(long)]
    pub context_mode: Option<ContextMode>,
}

/// Where the two artifacts of a run go.
#[derive(Debug, Clone, Serialize)]
pub struct OutputPaths {
    pub report: PathBuf,
    pub errors: PathBuf,
}

impl OutputPaths {
    /// Fills in `archive_files_<timestamp>.csv` / `permission_errors_<timestamp>.txt` for paths
    /// not given.
    pub fn resolve(output: Option<PathBuf>, errors_output: Option<PathBuf>) -> Self {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self {
            report: output.unwrap_or_else(|| PathBuf::from(format!("archive_files_{stamp}.csv"))),
            errors: errors_output
                .unwrap_or_else(|| PathBuf::from(format!("permission_errors_{stamp}.txt"))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub account: String,
    pub projects: usize,
    pub archive_files: usize,
    pub denied_projects: Vec<String>,
    pub failed_projects: Vec<String>,
    pub paths: OutputPaths,
}

/// Async CLI entrypoint for integration tests and main().
pub async fn run(cli: Cli) -> Result<RunSummary> {
    tracing::info!("trace_initialised");

    let file_config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        concurrency: cli.concurrency,
        context_mode: cli.context_mode,
    };
    let config = file_config.into_scan_config(&cli.org_id, &overrides);
    config.trace_loaded();

    let paths = OutputPaths::resolve(cli.output, cli.errors_output);
    execute(config, paths, Arc::new(ProcessRunner::new())).await
}

/// Runs one full scan: auth check, artifact creation, project enumeration, fan-out, report.
pub async fn execute(
    config: ScanConfig,
    paths: OutputPaths,
    runner: Arc<dyn CommandRunner>,
) -> Result<RunSummary> {
    let cloud = CloudCli::new(Arc::clone(&runner), &config);

    let account = cloud.check_auth().await?;
    println!("Using account: {account}");

    let csv = CsvReport::create(&paths.report)
        .with_context(|| format!("Failed to create report {}", paths.report.display()))?;
    let denied = Arc::new(
        DeniedFile::create(&paths.errors)
            .with_context(|| format!("Failed to create {}", paths.errors.display()))?,
    );

    println!(
        "Fetching projects in organization: {}...",
        config.organization_id
    );
    let projects = match cloud.list_projects(&config.organization_id).await {
        Ok(projects) => projects,
        Err(e) => {
            print_enumeration_failure(&e);
            return Err(e.into());
        }
    };

    println!("Found {} projects", projects.len());
    println!("Searching for archive files in buckets...");
    println!("========================================");

    let project_count = projects.len();
    let scanner = Scanner::new(&config, runner, denied);
    let report = scanner.scan(projects).await;

    csv.append(&report.records)
        .with_context(|| format!("Failed to write report {}", paths.report.display()))?;

    println!("========================================");
    println!("Finished searching for archive files.");
    println!("Found {} archive files.", report.records.len());
    println!(
        "Found {} projects with permission issues.",
        report.denied_count()
    );
    if !report.failed_projects.is_empty() {
        println!(
            "Failed to scan {} projects: {}",
            report.failed_projects.len(),
            report.failed_projects.join(", ")
        );
    }
    println!("Results have been saved to: {}", paths.report.display());
    if report.denied_count() > 0 {
        println!(
            "Projects with permission issues have been saved to: {}",
            paths.errors.display()
        );
    }

    let summary = RunSummary {
        account,
        projects: project_count,
        archive_files: report.records.len(),
        denied_projects: report.denied_projects,
        failed_projects: report.failed_projects,
        paths,
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => tracing::debug!(json = %json, "Run summary as JSON"),
        Err(e) => tracing::error!(error = ?e, "Failed to serialize run summary as JSON"),
    }
    Ok(summary)
}

/// Prints the role hint. `main` reports the error itself.
fn print_enumeration_failure(error: &ScanError) {
    if error.needs_role_hint() {
        eprintln!("No projects found. Please ensure you have the following permissions:");
        for role in REQUIRED_ROLES {
            eprintln!("- {role}");
        }
    }
}
