//! # report: the two artifacts a scan leaves behind
//!
//! - [`CsvReport`]: `project_id,bucket_url,file_type,file_path`, header written when the file
//!   is created, rows appended once the scan is done.
//! - [`DeniedFile`]: a comment line followed by one denied project ID per line. Workers append
//!   to it concurrently through the [`DeniedSink`] trait.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::contract::{ArchiveRecord, DeniedSink};
use crate::error::ScanError;

pub const CSV_HEADER: [&str; 4] = ["project_id", "bucket_url", "file_type", "file_path"];
pub const DENIED_FILE_HEADER: &str = "# Projects with permission issues";

pub struct CsvReport {
    path: PathBuf,
}

impl CsvReport {
    /// Creates (or truncates) the report and writes the header row.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ScanError> {
        let path = path.into();
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        info!(path = %path.display(), "Created CSV report");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends rows below whatever the file already holds.
    pub fn append(&self, records: &[ArchiveRecord]) -> Result<(), ScanError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        debug!(path = %self.path.display(), rows = records.len(), "Appended rows to CSV report");
        Ok(())
    }
}

/// Reads a report written by [`CsvReport`] back into records.
pub fn read_report(path: impl AsRef<Path>) -> Result<Vec<ArchiveRecord>, ScanError> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize::<ArchiveRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Append-only list of denied projects, safe to share between workers.
pub struct DeniedFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl DeniedFile {
    /// Creates (or truncates) the file and writes the comment line.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ScanError> {
        let path = path.into();
        let mut file = File::create(&path)?;
        writeln!(file, "{DENIED_FILE_HEADER}")?;
        info!(path = %path.display(), "Created permission errors file");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DeniedSink for DeniedFile {
    async fn record_denied(&self, project_id: &str) -> std::io::Result<()> {
        let line = format!("{project_id}\n");
        let mut file = self
            .file
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "denied file lock poisoned"))?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}
