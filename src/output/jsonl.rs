//! JSON-lines dataset file

use crate::output::traits::{OutputResult, RecordSink};
use crate::output::CrawlReport;
use crate::product::ProductRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends one JSON object per record to a file
///
/// Existing content is kept, so repeated runs accumulate into one dataset.
/// Every line is flushed as soon as it is pushed.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl JsonLinesSink {
    /// Opens (or creates) the dataset file, creating parent directories
    pub fn open(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::debug!("Writing dataset to {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written by this sink
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl RecordSink for JsonLinesSink {
    fn push(&mut self, record: &ProductRecord) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn complete(&mut self, report: &CrawlReport) -> OutputResult<()> {
        self.flush()?;
        tracing::info!(
            "Wrote {} records to {} ({})",
            self.written,
            self.path.display(),
            report.stop_reason
        );
        Ok(())
    }
}
