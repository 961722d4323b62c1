//! `load_config` module: loads the optional YAML settings file and merges it with CLI flags
//! into the core [`ScanConfig`].
//!
//! # Responsibilities
//! - Parse the user-supplied YAML file into [`FileConfig`]; every key is optional
//! - Apply command-line overrides on top (flags win over the file)
//! - Surface clear diagnostics: any failure in loading is an `anyhow::Error` with the path
//!
//! Accepted keys: `archive_extensions`, `skip_buckets`, `concurrency`, `context_mode`,
//! `gcloud_bin`, `gsutil_bin`.
use anyhow::{Context, Result};
use archive_finder_core::config::{ContextMode, ScanConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub archive_extensions: Option<Vec<String>>,
    pub skip_buckets: Option<Vec<String>>,
    pub concurrency: Option<usize>,
    pub context_mode: Option<ContextMode>,
    pub gcloud_bin: Option<String>,
    pub gsutil_bin: Option<String>,
}

/// Flag values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub concurrency: Option<usize>,
    pub context_mode: Option<ContextMode>,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file is a valid "all defaults" config.
    if config_content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    let parsed: FileConfig = serde_yaml::from_str(&config_content)
        .with_context(|| format!("Failed to parse config YAML {:?}", path_ref))?;
    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    Ok(parsed)
}

impl FileConfig {
    pub fn into_scan_config(self, organization_id: &str, overrides: &Overrides) -> ScanConfig {
        let mut config = ScanConfig::new(organization_id);
        if let Some(extensions) = self.archive_extensions {
            config = config.with_extensions(extensions);
        }
        if let Some(skip) = self.skip_buckets {
            config.skip_buckets = skip;
        }
        if let Some(concurrency) = overrides.concurrency.or(self.concurrency) {
            config = config.with_concurrency(concurrency);
        }
        if let Some(mode) = overrides.context_mode.or(self.context_mode) {
            config.context_mode = mode;
        }
        if let Some(gcloud) = self.gcloud_bin {
            config.gcloud_bin = gcloud;
        }
        if let Some(gsutil) = self.gsutil_bin {
            config.gsutil_bin = gsutil;
        }
        config
    }
}
