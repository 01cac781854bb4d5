//! End-of-run report

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Why the crawl loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The emission cap was reached
    MaxProducts,

    /// The last search page had no next-page link
    NoNextPage,

    /// The next-page link pointed at a page already walked
    PaginationLoop,

    /// The configured search page limit was reached
    MaxPages,

    /// A search page could not be fetched
    SearchPageFailed,

    /// A record could not be written to the sink
    SinkFailed,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxProducts => "max_products",
            Self::NoNextPage => "no_next_page",
            Self::PaginationLoop => "pagination_loop",
            Self::MaxPages => "max_pages",
            Self::SearchPageFailed => "search_page_failed",
            Self::SinkFailed => "sink_failed",
        }
    }

    /// Returns true if the run ended because a page could not be fetched or
    /// a record could not be written
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::SearchPageFailed | Self::SinkFailed)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters collected over one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub stop_reason: StopReason,

    /// Search result pages fetched
    pub pages_visited: u32,

    /// Product pages fetched successfully
    pub products_fetched: u64,

    /// Product pages that could not be fetched
    pub product_failures: u64,

    /// Records handed to the sink
    pub emitted: u64,

    /// Records dropped by the price filter
    pub filtered: u64,

    /// Product links skipped because their ASIN was already seen
    pub duplicates_skipped: u64,

    pub rotations: u32,
    pub emergency_rotations: u32,
    pub sessions_used: u32,

    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn new(stop_reason: StopReason) -> Self {
        Self {
            stop_reason,
            pages_visited: 0,
            products_fetched: 0,
            product_failures: 0,
            emitted: 0,
            filtered: 0,
            duplicates_skipped: 0,
            rotations: 0,
            emergency_rotations: 0,
            sessions_used: 1,
            elapsed: Duration::ZERO,
        }
    }

    /// Share of attempted product pages that were fetched, as a percentage
    pub fn fetch_success_rate(&self) -> f64 {
        let attempted = self.products_fetched + self.product_failures;
        if attempted == 0 {
            return 0.0;
        }
        (self.products_fetched as f64 / attempted as f64) * 100.0
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

/// Prints a run report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Run:");
    println!("  Stopped: {}", report.stop_reason);
    println!("  Elapsed: {:.1}s", report.elapsed.as_secs_f64());
    println!("  Search pages: {}", report.pages_visited);
    println!();

    println!("Products:");
    println!(
        "  Fetched: {} ({:.1}% of attempted)",
        report.products_fetched,
        report.fetch_success_rate()
    );
    println!("  Failed: {}", report.product_failures);
    println!("  Emitted: {}", report.emitted);
    println!("  Filtered by price: {}", report.filtered);
    println!("  Duplicates skipped: {}", report.duplicates_skipped);
    println!();

    println!("Sessions:");
    println!("  Used: {}", report.sessions_used);
    println!(
        "  Rotations: {} ({} emergency)",
        report.rotations, report.emergency_rotations
    );
}
