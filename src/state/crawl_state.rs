use std::collections::HashSet;

/// Process-wide crawl progress
///
/// `seen_asins` only ever grows, which is what guarantees at-most-once
/// emission per ASIN within a run.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// ASINs already extracted this run
    seen_asins: HashSet<String>,

    /// Search result pages already fetched (loop guard for pagination)
    visited_pages: HashSet<String>,

    /// Records handed to the sink
    pub emitted_count: u64,

    /// Search result page currently being walked
    pub current_page_url: Option<String>,

    /// Search result pages fetched successfully
    pub pages_visited: u32,
}

impl CrawlState {
    /// Creates an empty state positioned at the start URL
    pub fn new(start_url: &str) -> Self {
        Self {
            seen_asins: HashSet::new(),
            visited_pages: HashSet::new(),
            emitted_count: 0,
            current_page_url: Some(start_url.to_string()),
            pages_visited: 0,
        }
    }

    /// Returns true if the ASIN has already been extracted
    pub fn is_seen(&self, asin: &str) -> bool {
        self.seen_asins.contains(asin)
    }

    /// Remembers an ASIN; returns false if it was already known
    pub fn mark_seen(&mut self, asin: &str) -> bool {
        self.seen_asins.insert(asin.to_string())
    }

    /// Number of distinct ASINs remembered
    pub fn seen_count(&self) -> usize {
        self.seen_asins.len()
    }

    /// Records a fetched search page; returns false if it was visited before
    pub fn mark_page_visited(&mut self, url: &str) -> bool {
        let fresh = self.visited_pages.insert(url.to_string());
        if fresh {
            self.pages_visited += 1;
        }
        fresh
    }

    /// Returns true if the search page was fetched earlier in the run
    pub fn was_page_visited(&self, url: &str) -> bool {
        self.visited_pages.contains(url)
    }

    /// Counts one emitted record
    pub fn record_emitted(&mut self) {
        self.emitted_count += 1;
    }

    /// Returns true while more records may be emitted
    pub fn has_capacity(&self, max_products: u64) -> bool {
        self.emitted_count < max_products
    }

    /// Records still allowed before the cap
    pub fn remaining(&self, max_products: u64) -> u64 {
        max_products.saturating_sub(self.emitted_count)
    }
}
