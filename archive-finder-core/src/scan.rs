//! High-level pipeline: fan out over projects, list buckets, search each bucket for archives.
//!
//! # Major Types
//! - [`Scanner`]: per-project worker plus the shared collaborators it needs
//! - [`fan_out`]: bounded-concurrency scheduler, independent of what the worker does
//!
//! # Failure policy
//! Nothing in here returns an error. A project whose buckets cannot be listed is recorded as
//! permission-denied; a worker that panics is reported in [`ScanReport::failed_projects`]. Either
//! way the remaining projects keep going.
//!
//! # Project context
//! In [`ContextMode::Ambient`] the `gcloud` project setting is process-global, so each project's
//! pipeline holds a scan-wide lock from "set project" until its last bucket is searched.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::{ContextMode, ScanConfig};
use crate::contract::{CommandRunner, DeniedSink, ProjectOutcome, ScanReport};
use crate::gcloud::CloudCli;
use crate::search::ArchiveSearcher;

#[derive(Clone)]
pub struct Scanner {
    cli: CloudCli,
    searcher: ArchiveSearcher,
    extensions: Arc<[String]>,
    denied: Arc<dyn DeniedSink>,
    concurrency: usize,
    context_lock: Arc<Mutex<()>>,
}

impl Scanner {
    pub fn new(
        config: &ScanConfig,
        runner: Arc<dyn CommandRunner>,
        denied: Arc<dyn DeniedSink>,
    ) -> Self {
        let cli = CloudCli::new(runner, config);
        let searcher = ArchiveSearcher::new(cli.clone(), config.skip_buckets.clone());
        Self {
            cli,
            searcher,
            extensions: config.archive_extensions.clone().into(),
            denied,
            concurrency: config.concurrency.max(1),
            context_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Lists the project's buckets and searches each one, in listed order.
    ///
    /// A denied project is written to the denied sink and no bucket is searched.
    pub async fn process_project(&self, project_id: &str) -> ProjectOutcome {
        let _context = match self.cli.context_mode() {
            ContextMode::Ambient => Some(self.context_lock.lock().await),
            ContextMode::Explicit => None,
        };

        info!(project_id = %project_id, "--- Project: {project_id} ---");
        let listing = self.cli.list_buckets(project_id).await;

        if !listing.has_permission {
            warn!(project_id = %project_id, "Permission denied for project {project_id}");
            if let Err(e) = self.denied.record_denied(project_id).await {
                error!(project_id = %project_id, error = ?e, "Failed to record denied project");
            }
            return ProjectOutcome::denied(project_id);
        }

        if listing.buckets.is_empty() {
            info!(project_id = %project_id, "No buckets found in project {project_id}");
            return ProjectOutcome::accessible(project_id, Vec::new());
        }

        let mut records = Vec::new();
        for bucket_url in &listing.buckets {
            info!(project_id = %project_id, bucket_url = %bucket_url, "Scanning bucket: {bucket_url}");
            let hits = self.searcher.search(bucket_url, &self.extensions).await;
            records.extend(
                hits.into_iter()
                    .map(|hit| hit.into_record(project_id, bucket_url)),
            );
        }
        info!(project_id = %project_id, records = records.len(), "Finished project");
        ProjectOutcome::accessible(project_id, records)
    }

    /// Processes every project with at most `concurrency` pipelines in flight.
    pub async fn scan(&self, projects: Vec<String>) -> ScanReport {
        info!(projects = projects.len(), concurrency = self.concurrency, "Starting scan");
        let scanner = self.clone();
        let report = fan_out(projects, self.concurrency, move |project| {
            let scanner = scanner.clone();
            async move { scanner.process_project(&project).await }
        })
        .await;
        info!(
            records = report.records.len(),
            denied = report.denied_count(),
            failed = report.failed_projects.len(),
            "Scan finished"
        );
        report
    }
}

/// Runs `worker` once per project, each on its own task, gated by a semaphore of
/// `concurrency` permits. Waits for all of them and aggregates in completion order.
pub async fn fan_out<F, Fut>(projects: Vec<String>, concurrency: usize, worker: F) -> ScanReport
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = ProjectOutcome> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let submitted = projects.clone();
    let mut pending: HashMap<String, usize> = HashMap::new();

    for project in projects {
        *pending.entry(project.clone()).or_default() += 1;
        let sem = Arc::clone(&semaphore);
        let work = worker(project.clone());
        tasks.spawn(async move {
            // The semaphore is never closed, so the permit is always granted.
            let _permit = sem.acquire_owned().await.ok();
            let result = AssertUnwindSafe(work).catch_unwind().await;
            (project, result)
        });
    }

    let mut report = ScanReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((project, result)) => {
                settle(&mut pending, &project);
                match result {
                    Ok(outcome) => report.push(outcome),
                    Err(_) => {
                        error!(project_id = %project, "Project worker panicked");
                        report.failed_projects.push(project);
                    }
                }
            }
            Err(e) => {
                error!(error = ?e, "Project task could not be joined");
            }
        }
    }

    // Tasks that could not be joined never reported their project; account for them here.
    for project in submitted {
        if settle(&mut pending, &project) {
            error!(project_id = %project, "Project finished without an outcome");
            report.failed_projects.push(project);
        }
    }
    report
}

/// Marks one submission of `project` as settled. Returns false if none was outstanding.
fn settle(pending: &mut HashMap<String, usize>, project: &str) -> bool {
    match pending.get_mut(project) {
        Some(count) if *count > 0 => {
            *count -= 1;
            true
        }
        _ => false,
    }
}
