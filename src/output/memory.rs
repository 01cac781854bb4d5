use crate::output::traits::{OutputResult, RecordSink};
use crate::output::CrawlReport;
use crate::product::ProductRecord;

/// Keeps every record in memory
///
/// Used by tests and by callers that post-process a run themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<ProductRecord>,
    report: Option<CrawlReport>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }

    /// The report passed to `complete`, once the run is over
    pub fn report(&self) -> Option<&CrawlReport> {
        self.report.as_ref()
    }
}

impl RecordSink for MemorySink {
    fn push(&mut self, record: &ProductRecord) -> OutputResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn complete(&mut self, report: &CrawlReport) -> OutputResult<()> {
        self.report = Some(report.clone());
        Ok(())
    }
}

/// Forwards every call to each inner sink in order
///
/// The first error stops a `push` or `flush` fan-out and is returned.
/// `complete` reaches every sink and returns the first error.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn add(&mut self, sink: Box<dyn RecordSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RecordSink for FanoutSink {
    fn push(&mut self, record: &ProductRecord) -> OutputResult<()> {
        for sink in &mut self.sinks {
            sink.push(record)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }

    fn complete(&mut self, report: &CrawlReport) -> OutputResult<()> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.complete(report) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
