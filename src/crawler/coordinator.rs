//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that walks search result pages:
//! - Fetching a search page and extracting its product links
//! - Fetching each unseen product and extracting its record
//! - Filtering by price and emitting to the record sink
//! - Following the next-page link until a stop condition is reached
//!
//! The loop is strictly sequential: one request in flight at a time.

use crate::config::{validate, Config, CrawlConfig};
use crate::crawler::extract::{extract_product, extract_search_page, SearchPage};
use crate::crawler::{FetchOutcome, Fetcher};
use crate::identity::{IdentityProvider, ProxyGateway, RotatingIdentity};
use crate::output::{CrawlReport, RecordSink, StopReason};
use crate::product::PriceFilter;
use crate::state::{CrawlPhase, CrawlState, RotationPolicy, SessionRotator};
use crate::url::extract_asin;
use crate::ScoutError;
use std::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    products_fetched: u64,
    product_failures: u64,
    filtered: u64,
    duplicates_skipped: u64,
}

/// Main crawler coordinator structure
///
/// Owns the crawl state and the session rotator for the whole run; the
/// fetcher borrows the rotator per request.
pub struct Coordinator<S: RecordSink, I: IdentityProvider = RotatingIdentity> {
    crawl: CrawlConfig,
    fetcher: Fetcher<I>,
    rotator: SessionRotator,
    filter: PriceFilter,
    state: CrawlState,
    phase: CrawlPhase,
    sink: S,
    counters: Counters,
}

impl<S: RecordSink> Coordinator<S> {
    /// Validates `config` and creates a coordinator using the configured
    /// proxy gateway, if any
    pub fn new(config: &Config, sink: S) -> Result<Self, ScoutError> {
        validate(config)?;
        let gateway = ProxyGateway::from_config(&config.proxy)?;
        Ok(Self::with_identity(config, RotatingIdentity::new(gateway), sink))
    }
}

impl<S: RecordSink, I: IdentityProvider> Coordinator<S, I> {
    pub fn with_identity(config: &Config, identity: I, sink: S) -> Self {
        let rotator =
            SessionRotator::new(RotationPolicy::from(&config.session), identity.has_proxy());

        Self {
            crawl: config.crawl.clone(),
            fetcher: Fetcher::from_config(config, identity),
            rotator,
            filter: PriceFilter::from(&config.crawl),
            state: CrawlState::new(&config.crawl.start_url),
            phase: CrawlPhase::FetchingSearchPage,
            sink,
            counters: Counters::default(),
        }
    }

    /// Runs the crawl loop to completion
    ///
    /// Fetch failures never end the run with an error: a failed product is
    /// skipped and a failed search page stops the run with
    /// [`StopReason::SearchPageFailed`]. Only a sink failure is an error; the
    /// sink is still completed with [`StopReason::SinkFailed`] first.
    pub async fn run(&mut self) -> Result<CrawlReport, ScoutError> {
        tracing::info!(
            "Starting crawl at {} (max {} products, price ceiling ${:.2})",
            self.crawl.start_url,
            self.crawl.max_products,
            self.filter.ceiling
        );

        let start_time = Instant::now();
        let result = self.crawl_pages().await;
        self.enter(CrawlPhase::Terminal);

        let stop_reason = match result {
            Ok(stop_reason) => stop_reason,
            Err(e) => {
                let report = self.report(StopReason::SinkFailed, start_time);
                if let Err(complete_err) = self.sink.complete(&report) {
                    tracing::warn!("Could not finish the failed run: {}", complete_err);
                }
                return Err(e);
            }
        };
        let report = self.report(stop_reason, start_time);
        self.sink.complete(&report)?;

        tracing::info!(
            "Crawl finished ({}): {} products emitted from {} pages in {:?}",
            report.stop_reason,
            report.emitted,
            report.pages_visited,
            report.elapsed
        );

        Ok(report)
    }

    async fn crawl_pages(&mut self) -> Result<StopReason, ScoutError> {
        let mut page_url = self.crawl.start_url.clone();

        loop {
            self.state.current_page_url = Some(page_url.clone());

            let search = match self.fetch_search_page(&page_url).await {
                Some(search) => search,
                None => {
                    tracing::error!(
                        "Search page {} could not be fetched, stopping crawl",
                        page_url
                    );
                    return Ok(StopReason::SearchPageFailed);
                }
            };

            tracing::info!(
                "Page {}: {} product links ({}/{} emitted so far)",
                self.state.pages_visited,
                search.product_links.len(),
                self.state.emitted_count,
                self.crawl.max_products
            );

            for link in &search.product_links {
                if !self.state.has_capacity(self.crawl.max_products) {
                    break;
                }
                self.process_product(link).await?;
            }

            self.enter(CrawlPhase::FetchingNextPage);

            if !self.state.has_capacity(self.crawl.max_products) {
                tracing::info!("Reached max products ({})", self.crawl.max_products);
                return Ok(StopReason::MaxProducts);
            }

            if let Some(max_pages) = self.crawl.max_pages {
                if self.state.pages_visited >= max_pages {
                    tracing::info!("Reached max pages ({})", max_pages);
                    return Ok(StopReason::MaxPages);
                }
            }

            let next = match search.next_page {
                Some(next) => next,
                None => {
                    tracing::info!("No next page link on {}", page_url);
                    return Ok(StopReason::NoNextPage);
                }
            };

            if self.state.was_page_visited(&next) {
                tracing::warn!("Next page {} was already visited, stopping", next);
                return Ok(StopReason::PaginationLoop);
            }

            let pause = self.fetcher.pacer().page_pause();
            self.fetcher.pacer().pause(pause).await;

            self.enter(CrawlPhase::FetchingSearchPage);
            page_url = next;
        }
    }

    /// Fetches a search page and extracts what the loop needs from it
    async fn fetch_search_page(&mut self, url: &str) -> Option<SearchPage> {
        match self.fetcher.fetch(url, &mut self.rotator).await {
            FetchOutcome::Success(doc) => {
                self.enter(CrawlPhase::ExtractingLinks);
                self.state.mark_page_visited(doc.url().as_str());
                Some(extract_search_page(&doc))
            }
            outcome => {
                if let Some(reason) = outcome.failure() {
                    tracing::error!("Failed to fetch search page {}: {}", url, reason);
                }
                None
            }
        }
    }

    /// Fetches, extracts, filters and emits one product
    async fn process_product(&mut self, link: &str) -> Result<(), ScoutError> {
        let asin = extract_asin(link);
        if let Some(asin) = &asin {
            if self.state.is_seen(asin) {
                tracing::debug!("Skipping already seen ASIN {}", asin);
                self.counters.duplicates_skipped += 1;
                return Ok(());
            }
        }

        self.enter(CrawlPhase::FetchingProduct);
        let record = match self.fetcher.fetch(link, &mut self.rotator).await {
            FetchOutcome::Success(doc) => {
                self.enter(CrawlPhase::ExtractingProduct);
                extract_product(&doc, link)
            }
            outcome => {
                self.counters.product_failures += 1;
                if let Some(reason) = outcome.failure() {
                    tracing::warn!("Skipping product {}: {}", link, reason);
                }
                return Ok(());
            }
        };

        self.counters.products_fetched += 1;
        if let Some(asin) = &record.asin {
            self.state.mark_seen(asin);
        }

        self.enter(CrawlPhase::Emitting);
        match self.filter.apply(record) {
            Some(record) => {
                self.sink.push(&record)?;
                self.state.record_emitted();
                tracing::info!(
                    "Scraped product {}: {}",
                    self.state.emitted_count,
                    record.summary()
                );
            }
            None => {
                self.counters.filtered += 1;
                tracing::debug!("Filtered product over price ceiling: {}", link);
            }
        }

        Ok(())
    }

    fn enter(&mut self, next: CrawlPhase) {
        if !self.phase.can_transition_to(next) {
            tracing::warn!("Unexpected crawl phase transition {} -> {}", self.phase, next);
        }
        tracing::trace!("Crawl phase {} -> {}", self.phase, next);
        self.phase = next;
    }

    fn report(&self, stop_reason: StopReason, start_time: Instant) -> CrawlReport {
        CrawlReport {
            stop_reason,
            pages_visited: self.state.pages_visited,
            products_fetched: self.counters.products_fetched,
            product_failures: self.counters.product_failures,
            emitted: self.state.emitted_count,
            filtered: self.counters.filtered,
            duplicates_skipped: self.counters.duplicates_skipped,
            rotations: self.rotator.rotations(),
            emergency_rotations: self.rotator.emergency_rotations(),
            sessions_used: self.rotator.sessions_created(),
            elapsed: start_time.elapsed(),
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn rotator(&self) -> &SessionRotator {
        &self.rotator
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{MemorySink, OutputError, OutputResult};
    use crate::product::ProductRecord;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Refuses every record and remembers how the run was completed
    #[derive(Default)]
    struct RejectingSink {
        completed: Option<StopReason>,
    }

    impl RecordSink for RejectingSink {
        fn push(&mut self, _record: &ProductRecord) -> OutputResult<()> {
            Err(OutputError::Write("disk full".to_string()))
        }

        fn complete(&mut self, report: &CrawlReport) -> OutputResult<()> {
            self.completed = Some(report.stop_reason);
            Ok(())
        }
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(
            format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
            "text/html",
        )
    }

    fn config(start_url: &str) -> Config {
        let mut config = Config::default();
        config.crawl.start_url = start_url.to_string();
        config.pacing.min_delay = 0.0;
        config.pacing.max_delay = 0.0;
        config.pacing.page_pause_min = 0.0;
        config.pacing.page_pause_max = 0.0;
        config.pacing.max_retries = 1;
        config
    }

    #[test]
    fn test_new_coordinator_starts_at_search_page() {
        let coordinator =
            Coordinator::new(&config("https://www.amazon.com/s?k=x"), MemorySink::new()).unwrap();
        assert_eq!(coordinator.phase(), CrawlPhase::FetchingSearchPage);
        assert_eq!(coordinator.state().emitted_count, 0);
        assert_eq!(coordinator.rotator().sessions_created(), 1);
    }

    #[test]
    fn test_proxy_without_password_is_rejected() {
        let mut config = config("https://www.amazon.com/s?k=x");
        config.proxy.enabled = true;
        config.proxy.password = None;
        std::env::remove_var(crate::identity::PROXY_PASSWORD_ENV);

        assert!(matches!(
            Coordinator::new(&config, MemorySink::new()),
            Err(ScoutError::Identity(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = config("https://www.amazon.com/s?k=x");
        config.pacing.max_delay = 1e20;

        assert!(matches!(
            Coordinator::new(&config, MemorySink::new()),
            Err(ScoutError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_sink_failure_still_completes_run() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(html(
                r#"<div data-component-type="s-search-result">
                     <h2><a href="/a/dp/B000000001">Result</a></h2>
                   </div>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/a/dp/B000000001"))
            .respond_with(html(
                r#"<span id="productTitle">A</span><span class="a-price-whole">9.</span>"#,
            ))
            .mount(&server)
            .await;

        let mut coordinator = Coordinator::new(
            &config(&format!("{}/s", server.uri())),
            RejectingSink::default(),
        )
        .unwrap();

        let result = coordinator.run().await;

        assert!(matches!(result, Err(ScoutError::Output(_))));
        assert_eq!(coordinator.phase(), CrawlPhase::Terminal);
        assert_eq!(coordinator.sink().completed, Some(StopReason::SinkFailed));
    }

    #[tokio::test]
    async fn test_unreachable_start_page_ends_run() {
        let mut coordinator =
            Coordinator::new(&config("http://127.0.0.1:9/s?k=x"), MemorySink::new()).unwrap();

        let report = coordinator.run().await.unwrap();

        assert_eq!(report.stop_reason, StopReason::SearchPageFailed);
        assert_eq!(report.emitted, 0);
        assert_eq!(coordinator.phase(), CrawlPhase::Terminal);
        assert_eq!(
            coordinator.sink().report().map(|r| r.stop_reason),
            Some(StopReason::SearchPageFailed)
        );
    }
}
