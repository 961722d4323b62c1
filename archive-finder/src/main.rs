use std::process::ExitCode;

use archive_finder::cli::{run, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!(org_id = %cli.org_id, "CLI arguments parsed, invoking run");
    match run(cli).await {
        Ok(summary) => {
            tracing::info!(
                archive_files = summary.archive_files,
                denied = summary.denied_projects.len(),
                "CLI completed successfully"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[ERROR] archive-finder failed: {e:#}");
            tracing::error!(error = %e, "CLI exited with error");
            ExitCode::FAILURE
        }
    }
}
