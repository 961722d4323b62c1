use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_ARCHIVE_EXTENSIONS: [&str; 3] = [".zip", ".tar", ".gz"];
pub const DEFAULT_SKIPPED_BUCKET: &str = "gs://angels-bbops-video-dr/";

/// How downstream commands are bound to a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Every command names its project; no shared CLI state is touched.
    #[default]
    Explicit,
    /// `gcloud config set project` followed by context-dependent calls. Projects are processed
    /// one at a time while holding a scan-wide lock.
    Ambient,
}

impl std::str::FromStr for ContextMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "explicit" => Ok(ContextMode::Explicit),
            "ambient" => Ok(ContextMode::Ambient),
            other => Err(format!(
                "unknown context mode '{other}', expected 'explicit' or 'ambient'"
            )),
        }
    }
}

/// Effective settings for one scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanConfig {
    pub organization_id: String,
    /// Extensions searched in this order, each with a leading dot.
    pub archive_extensions: Vec<String>,
    pub skip_buckets: Vec<String>,
    pub concurrency: usize,
    pub context_mode: ContextMode,
    pub gcloud_bin: String,
    pub gsutil_bin: String,
}

impl ScanConfig {
    pub fn new(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            archive_extensions: DEFAULT_ARCHIVE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            skip_buckets: vec![DEFAULT_SKIPPED_BUCKET.to_string()],
            concurrency: DEFAULT_CONCURRENCY,
            context_mode: ContextMode::default(),
            gcloud_bin: "gcloud".to_string(),
            gsutil_bin: "gsutil".to_string(),
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.archive_extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| ext.len() > 1)
            .collect();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn trace_loaded(&self) {
        info!(
            organization_id = %self.organization_id,
            extensions = ?self.archive_extensions,
            skip_buckets = self.skip_buckets.len(),
            concurrency = self.concurrency,
            context_mode = ?self.context_mode,
            "Loaded scan config"
        );
        debug!(?self, "Scan config loaded (full debug)");
    }
}

/// `zip` and `.zip` both become `.zip`.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}
