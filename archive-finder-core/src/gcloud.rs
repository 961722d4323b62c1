//! # gcloud: typed wrappers around the `gcloud` and `gsutil` invocations
//!
//! Every external call the scan makes is built here, so the command lines live in one place.
//! Parsing is line-oriented: blank lines are dropped, nothing is sorted or deduplicated.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ContextMode, ScanConfig};
use crate::contract::{BucketListing, CommandOutput, CommandRunner};
use crate::error::ScanError;

/// Cloud CLI facade shared by all project workers.
#[derive(Clone)]
pub struct CloudCli {
    runner: Arc<dyn CommandRunner>,
    gcloud: String,
    gsutil: String,
    context_mode: ContextMode,
}

impl CloudCli {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &ScanConfig) -> Self {
        Self {
            runner,
            gcloud: config.gcloud_bin.clone(),
            gsutil: config.gsutil_bin.clone(),
            context_mode: config.context_mode,
        }
    }

    pub fn context_mode(&self) -> ContextMode {
        self.context_mode
    }

    async fn gcloud(&self, args: &[&str]) -> CommandOutput {
        self.run(&self.gcloud, args).await
    }

    async fn gsutil(&self, args: &[&str]) -> CommandOutput {
        self.run(&self.gsutil, args).await
    }

    async fn run(&self, program: &str, args: &[&str]) -> CommandOutput {
        let mut command = Vec::with_capacity(args.len() + 1);
        command.push(program.to_string());
        command.extend(args.iter().map(|a| a.to_string()));
        self.runner.run(&command).await
    }

    /// Returns the active account, or fails when there is none.
    pub async fn check_auth(&self) -> Result<String, ScanError> {
        let out = self
            .gcloud(&[
                "auth",
                "list",
                "--filter=status:ACTIVE",
                "--format=value(account)",
            ])
            .await;
        if !out.ok {
            return Err(ScanError::AuthCheck(out.output));
        }
        let account = out.lines().next().map(str::to_string);
        match account {
            Some(account) => {
                info!(account = %account, "Active gcloud account found");
                Ok(account)
            }
            None => Err(ScanError::NoActiveAccount),
        }
    }

    /// All projects in the organization, in the order the asset search returns them.
    pub async fn list_projects(&self, organization_id: &str) -> Result<Vec<String>, ScanError> {
        info!(organization_id = %organization_id, "Fetching projects in organization");
        let scope = format!("--scope=organizations/{organization_id}");
        let out = self
            .gcloud(&[
                "asset",
                "search-all-resources",
                &scope,
                "--asset-types=cloudresourcemanager.googleapis.com/Project",
                "--format=value(name.basename())",
                "--quiet",
            ])
            .await;
        if !out.ok {
            return Err(ScanError::ProjectEnumeration(out.output));
        }
        let projects: Vec<String> = out.lines().map(str::to_string).collect();
        if projects.is_empty() {
            return Err(ScanError::NoProjects(organization_id.to_string()));
        }
        Ok(projects)
    }

    /// Resolves the project context, then lists its buckets. Failure at either step is reported
    /// as a permission problem; an empty but successful listing is not.
    pub async fn list_buckets(&self, project_id: &str) -> BucketListing {
        let (context, listing) = match self.context_mode {
            ContextMode::Explicit => {
                let context = self
                    .gcloud(&["projects", "describe", project_id, "--format=value(projectId)"])
                    .await;
                if !context.ok {
                    (context, None)
                } else {
                    let listing = self.gsutil(&["ls", "-p", project_id]).await;
                    (context, Some(listing))
                }
            }
            ContextMode::Ambient => {
                let context = self
                    .gcloud(&["config", "set", "project", project_id, "--quiet"])
                    .await;
                if !context.ok {
                    (context, None)
                } else {
                    let listing = self.gsutil(&["ls"]).await;
                    (context, Some(listing))
                }
            }
        };

        let Some(listing) = listing else {
            warn!(project_id = %project_id, error = %context.output, "Could not set project context");
            return BucketListing::denied();
        };
        if !listing.ok {
            warn!(project_id = %project_id, error = %listing.output, "Could not list buckets");
            return BucketListing::denied();
        }

        let buckets: Vec<String> = listing
            .lines()
            .filter(|line| line.ends_with('/'))
            .map(str::to_string)
            .collect();
        debug!(project_id = %project_id, buckets = buckets.len(), "Listed buckets");
        BucketListing {
            buckets,
            has_permission: true,
        }
    }

    /// Recursive listing of `<bucket_url>*<extension>`.
    pub async fn list_matches(&self, bucket_url: &str, extension: &str) -> CommandOutput {
        let pattern = format!("{bucket_url}*{extension}");
        self.gsutil(&["ls", "-r", &pattern]).await
    }
}
