//! Record sink trait and error types
//!
//! A sink receives every record the crawl loop emits, in emission order, and
//! is told once when the run is over.

use crate::output::CrawlReport;
use crate::product::ProductRecord;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur while writing records
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for emitted product records
///
/// A failed `push` aborts the run; sinks are expected to be durable enough
/// that returning an error really means the dataset can no longer be written.
pub trait RecordSink {
    /// Appends one record
    fn push(&mut self, record: &ProductRecord) -> OutputResult<()>;

    /// Makes everything pushed so far durable
    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }

    /// Called once after the last record with the run's final report
    fn complete(&mut self, report: &CrawlReport) -> OutputResult<()> {
        let _ = report;
        self.flush()
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn push(&mut self, record: &ProductRecord) -> OutputResult<()> {
        (**self).push(record)
    }

    fn flush(&mut self) -> OutputResult<()> {
        (**self).flush()
    }

    fn complete(&mut self, report: &CrawlReport) -> OutputResult<()> {
        (**self).complete(report)
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn push(&mut self, record: &ProductRecord) -> OutputResult<()> {
        (**self).push(record)
    }

    fn flush(&mut self) -> OutputResult<()> {
        (**self).flush()
    }

    fn complete(&mut self, report: &CrawlReport) -> OutputResult<()> {
        (**self).complete(report)
    }
}
