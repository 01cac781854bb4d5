//! Output module for emitted records and run reports
//!
//! This module handles:
//! - The `RecordSink` interface the crawl loop emits into
//! - The JSON-lines dataset file, an in-memory sink and fan-out to several sinks
//! - The end-of-run report and dataset statistics

mod jsonl;
mod memory;
mod report;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use memory::{FanoutSink, MemorySink};
pub use report::{print_report, CrawlReport, StopReason};
pub use stats::{load_statistics, print_statistics, DatasetStatistics};
pub use traits::{OutputError, OutputResult, RecordSink};
