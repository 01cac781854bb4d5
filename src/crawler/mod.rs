//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with session-scoped clients and retry logic
//! - Jittered pacing between requests
//! - HTML parsing and field extraction
//! - Overall crawl coordination

mod coordinator;
mod document;
pub mod extract;
mod fetcher;
mod pacing;

pub use coordinator::Coordinator;
pub use document::Document;
pub use extract::SearchPage;
pub use fetcher::{build_session_client, FailureReason, FetchOutcome, Fetcher, FetcherSettings};
pub use pacing::{DelayRange, Pacer};

pub use crate::output::{CrawlReport, StopReason};

use crate::config::Config;
use crate::output::RecordSink;
use crate::ScoutError;

/// Runs a complete crawl into `sink`
///
/// This is the main entry point for starting a crawl. It builds the
/// identity (with the configured proxy gateway, if any), walks the search
/// pages and returns the final report.
pub async fn crawl<S: RecordSink>(config: &Config, sink: S) -> Result<CrawlReport, ScoutError> {
    let mut coordinator = Coordinator::new(config, sink)?;
    coordinator.run().await
}
