//! # contract: seams and plain data shared by the scanning pipeline
//!
//! Two traits live here:
//! - [`CommandRunner`]: runs one external program and reports `(output, ok)`.
//! - [`DeniedSink`]: receives the IDs of projects whose buckets could not be listed.
//!
//! Both are annotated for `mockall` so tests can script the cloud CLI and observe denials
//! without touching a real account. Everything else in this module is plain data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mockall::automock;

/// Result of running one external command.
///
/// `output` is the trimmed standard output when `ok` is true, and the error text otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: String,
    pub ok: bool,
}

impl CommandOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ok: true,
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ok: false,
        }
    }

    /// Non-blank output lines, in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

/// Trait for invoking external programs (`gcloud`, `gsutil`).
///
/// `args[0]` is the program; the rest are passed verbatim. A non-zero exit is not an error at
/// this level: it comes back as `ok == false` and the caller decides what it means.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> CommandOutput;
}

/// Destination for permission-denied project IDs.
///
/// Called concurrently from several project workers; implementors must never lose an entry or
/// interleave partial lines.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DeniedSink: Send + Sync {
    async fn record_denied(&self, project_id: &str) -> std::io::Result<()>;
}

/// One archive file found in a bucket. This is the row written to the CSV report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub project_id: String,
    pub bucket_url: String,
    /// Matched extension without its leading dot, e.g. `zip`.
    pub file_type: String,
    pub file_path: String,
}

/// A match returned by the archive search before project and bucket are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub file_type: String,
    pub file_path: String,
}

impl SearchHit {
    pub fn into_record(self, project_id: &str, bucket_url: &str) -> ArchiveRecord {
        ArchiveRecord {
            project_id: project_id.to_owned(),
            bucket_url: bucket_url.to_owned(),
            file_type: self.file_type,
            file_path: self.file_path,
        }
    }
}

/// Buckets visible for one project, and whether listing them was allowed at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketListing {
    pub buckets: Vec<String>,
    pub has_permission: bool,
}

impl BucketListing {
    pub fn denied() -> Self {
        Self {
            buckets: Vec::new(),
            has_permission: false,
        }
    }
}

/// What processing a single project produced.
///
/// `permission_denied` implies `records` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOutcome {
    pub project_id: String,
    pub records: Vec<ArchiveRecord>,
    pub permission_denied: bool,
}

impl ProjectOutcome {
    pub fn denied(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            records: Vec::new(),
            permission_denied: true,
        }
    }

    pub fn accessible(project_id: impl Into<String>, records: Vec<ArchiveRecord>) -> Self {
        Self {
            project_id: project_id.into(),
            records,
            permission_denied: false,
        }
    }
}

/// Aggregate of a whole scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// All records, project by project in completion order.
    pub records: Vec<ArchiveRecord>,
    pub denied_projects: Vec<String>,
    /// Projects whose worker task crashed before producing an outcome.
    pub failed_projects: Vec<String>,
}

impl ScanReport {
    pub fn denied_count(&self) -> usize {
        self.denied_projects.len()
    }

    pub fn push(&mut self, outcome: ProjectOutcome) {
        if outcome.permission_denied {
            self.denied_projects.push(outcome.project_id);
        } else {
            self.records.extend(outcome.records);
        }
    }
}

impl FromIterator<ProjectOutcome> for ScanReport {
    fn from_iter<I: IntoIterator<Item = ProjectOutcome>>(iter: I) -> Self {
        let mut report = ScanReport::default();
        for outcome in iter {
            report.push(outcome);
        }
        report
    }
}
