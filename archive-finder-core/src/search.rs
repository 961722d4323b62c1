//! Archive search within one bucket.

use tracing::{debug, info};

use crate::contract::SearchHit;
use crate::gcloud::CloudCli;

#[derive(Clone)]
pub struct ArchiveSearcher {
    cli: CloudCli,
    skip_buckets: Vec<String>,
}

impl ArchiveSearcher {
    pub fn new(cli: CloudCli, skip_buckets: Vec<String>) -> Self {
        Self { cli, skip_buckets }
    }

    pub fn is_skipped(&self, bucket_url: &str) -> bool {
        self.skip_buckets.iter().any(|skipped| skipped == bucket_url)
    }

    /// Lists files in `bucket_url` ending in each of `extensions`, one listing per extension.
    ///
    /// Hits keep listing order within an extension and extension order across them. A listing
    /// that fails counts as no matches. Skipped buckets return nothing.
    pub async fn search(&self, bucket_url: &str, extensions: &[String]) -> Vec<SearchHit> {
        if self.is_skipped(bucket_url) {
            info!(bucket_url = %bucket_url, "Skipping bucket");
            return Vec::new();
        }

        let mut hits = Vec::new();
        for ext in extensions {
            let out = self.cli.list_matches(bucket_url, ext).await;
            if !out.ok {
                debug!(bucket_url = %bucket_url, extension = %ext, error = %out.output, "No matches (listing failed)");
                continue;
            }
            let file_type = ext.strip_prefix('.').unwrap_or(ext);
            hits.extend(out.lines().map(|file_path| SearchHit {
                file_type: file_type.to_string(),
                file_path: file_path.to_string(),
            }));
        }
        hits
    }
}
