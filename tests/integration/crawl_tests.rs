//! Integration tests for the crawler
//!
//! These tests use wiremock to serve search result and product pages and run
//! the full crawl loop end-to-end against them.

use shelf_scout::config::{Config, OverCeilingPolicy};
use shelf_scout::crawler::Coordinator;
use shelf_scout::identity::IdentityProvider;
use shelf_scout::output::{FanoutSink, JsonLinesSink, MemorySink, StopReason};
use shelf_scout::storage::{SqliteDataset, SqliteStorage, Storage};
use std::collections::HashSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration that never sleeps
fn create_test_config(start_url: &str) -> Config {
    let mut config = Config::default();
    config.crawl.start_url = start_url.to_string();
    config.pacing.min_delay = 0.0;
    config.pacing.max_delay = 0.0;
    config.pacing.block_cooldown_min = 0.0;
    config.pacing.block_cooldown_max = 0.0;
    config.pacing.page_pause_min = 0.0;
    config.pacing.page_pause_max = 0.0;
    config.pacing.request_timeout = 5.0;
    config
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

/// A search result page linking the given product paths
fn search_page(product_paths: &[&str], next: Option<&str>) -> ResponseTemplate {
    let mut body = String::new();
    for product in product_paths {
        body.push_str(&format!(
            r#"<div data-component-type="s-search-result">
                 <h2><a href="{}?ref=sr_1">Result</a></h2>
               </div>"#,
            product
        ));
    }
    if let Some(next) = next {
        body.push_str(&format!(
            r#"<a class="s-pagination-next" href="{}">Next</a>"#,
            next
        ));
    }
    html(body)
}

fn product_page(title: &str, price: &str) -> ResponseTemplate {
    html(format!(
        r#"<span id="productTitle">{}</span>
           <span class="a-price-whole">{}</span>
           <div id="availability"><span>In Stock</span></div>"#,
        title, price
    ))
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_products_under_ceiling_are_emitted() {
    let server = MockServer::start().await;
    let paths = ["/Sony-WH/dp/B000000001", "/JLab-Go/dp/B000000002"];

    mount(&server, "/search/1", search_page(&paths, None)).await;
    mount(&server, paths[0], product_page("Sony WH-CH520", "38.")).await;
    mount(&server, paths[1], product_page("JLab Go Air", "19.")).await;

    let config = create_test_config(&format!("{}/search/1", server.uri()));
    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::NoNextPage);
    assert_eq!(report.emitted, 2);
    assert_eq!(report.pages_visited, 1);
    assert!(coordinator.state().is_seen("B000000001"));
    assert!(coordinator.state().is_seen("B000000002"));

    let records = coordinator.sink().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title.as_deref(), Some("Sony WH-CH520"));
    assert_eq!(records[0].numeric_price(), Some(38.0));
    assert_eq!(records[0].availability.as_deref(), Some("In Stock"));
    assert_eq!(records[1].asin.as_deref(), Some("B000000002"));
    // Query strings are stripped from product links
    assert!(records[0].url.ends_with("/Sony-WH/dp/B000000001"));
}

#[tokio::test]
async fn test_failed_product_is_skipped_and_crawl_continues() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/search/1",
        search_page(&["/a/dp/B000000001", "/b/dp/B000000002"], Some("/search/2")),
    )
    .await;
    mount(&server, "/search/2", search_page(&["/c/dp/B000000003"], None)).await;
    mount(&server, "/a/dp/B000000001", ResponseTemplate::new(500)).await;
    mount(&server, "/b/dp/B000000002", product_page("B", "10.")).await;
    mount(&server, "/c/dp/B000000003", product_page("C", "20.")).await;

    let config = create_test_config(&format!("{}/search/1", server.uri()));
    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::NoNextPage);
    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.product_failures, 1);
    assert_eq!(report.emitted, 2);
    // A failed product is not remembered
    assert!(!coordinator.state().is_seen("B000000001"));
}

#[tokio::test]
async fn test_search_page_failure_ends_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&format!("{}/search/1", server.uri()));
    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::SearchPageFailed);
    assert_eq!(report.emitted, 0);
    assert_eq!(report.pages_visited, 0);
    assert!(coordinator.sink().records().is_empty());
    assert!(coordinator.sink().report().is_some());
}

#[tokio::test]
async fn test_product_over_ceiling_is_filtered() {
    let server = MockServer::start().await;

    mount(&server, "/search/1", search_page(&["/x/dp/B000000150"], None)).await;
    mount(&server, "/x/dp/B000000150", product_page("Studio Headphones", "150.")).await;

    let config = create_test_config(&format!("{}/search/1", server.uri()));
    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.products_fetched, 1);
    assert_eq!(report.filtered, 1);
    assert_eq!(report.emitted, 0);
    // Extracted, so still remembered
    assert!(coordinator.state().is_seen("B000000150"));
}

#[tokio::test]
async fn test_flag_policy_emits_over_ceiling_products() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/search/1",
        search_page(&["/x/dp/B000000150", "/y/dp/B000000050"], None),
    )
    .await;
    mount(&server, "/x/dp/B000000150", product_page("Expensive", "1,150.")).await;
    mount(&server, "/y/dp/B000000050", product_page("Cheap", "50.")).await;

    let mut config = create_test_config(&format!("{}/search/1", server.uri()));
    config.crawl.over_ceiling = OverCeilingPolicy::Flag;

    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.emitted, 2);
    assert_eq!(report.filtered, 0);

    let records = coordinator.sink().records();
    assert_eq!(records[0].numeric_price(), Some(1150.0));
    assert!(records[0].over_price_ceiling);
    assert!(!records[1].over_price_ceiling);
}

#[tokio::test]
async fn test_max_products_caps_emission() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/search/1",
        search_page(
            &["/a/dp/B000000001", "/b/dp/B000000002", "/c/dp/B000000003"],
            Some("/search/2"),
        ),
    )
    .await;
    mount(&server, "/a/dp/B000000001", product_page("A", "1.")).await;
    mount(&server, "/b/dp/B000000002", product_page("B", "2.")).await;
    Mock::given(method("GET"))
        .and(path("/c/dp/B000000003"))
        .respond_with(product_page("C", "3."))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/2"))
        .respond_with(search_page(&[], None))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/search/1", server.uri()));
    config.crawl.max_products = 2;

    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::MaxProducts);
    assert_eq!(report.emitted, 2);
    assert_eq!(coordinator.sink().records().len(), 2);
}

#[tokio::test]
async fn test_duplicate_asins_across_pages_are_emitted_once() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/search/1",
        search_page(&["/a/dp/B000000001", "/b/dp/B000000002"], Some("/search/2")),
    )
    .await;
    mount(
        &server,
        "/search/2",
        search_page(&["/b-other-slug/dp/B000000002", "/c/dp/B000000003"], None),
    )
    .await;
    mount(&server, "/a/dp/B000000001", product_page("A", "1.")).await;
    mount(&server, "/b/dp/B000000002", product_page("B", "2.")).await;
    mount(&server, "/c/dp/B000000003", product_page("C", "3.")).await;

    let config = create_test_config(&format!("{}/search/1", server.uri()));
    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.emitted, 3);
    assert_eq!(report.duplicates_skipped, 1);

    let asins: HashSet<_> = coordinator
        .sink()
        .records()
        .iter()
        .filter_map(|r| r.asin.clone())
        .collect();
    assert_eq!(asins.len(), 3);
}

#[tokio::test]
async fn test_pagination_loop_is_detected() {
    let server = MockServer::start().await;

    mount(&server, "/search/1", search_page(&[], Some("/search/2"))).await;
    mount(&server, "/search/2", search_page(&[], Some("/search/1"))).await;

    let config = create_test_config(&format!("{}/search/1", server.uri()));
    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::PaginationLoop);
    assert_eq!(report.pages_visited, 2);
}

#[tokio::test]
async fn test_max_pages_limit() {
    let server = MockServer::start().await;

    mount(&server, "/search/1", search_page(&[], Some("/search/2"))).await;
    Mock::given(method("GET"))
        .and(path("/search/2"))
        .respond_with(search_page(&[], None))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/search/1", server.uri()));
    config.crawl.max_pages = Some(1);

    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::MaxPages);
    assert_eq!(report.pages_visited, 1);
}

#[tokio::test]
async fn test_disabled_rotation_uses_one_session() {
    let server = MockServer::start().await;
    let paths = ["/a/dp/B000000001", "/b/dp/B000000002", "/c/dp/B000000003"];

    mount(&server, "/search/1", search_page(&paths, None)).await;
    for p in paths {
        mount(&server, p, product_page("P", "5.")).await;
    }

    let mut config = create_test_config(&format!("{}/search/1", server.uri()));
    config.session.rotation_enabled = false;
    config.session.min_requests = 1;
    config.session.max_requests = 1;

    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.emitted, 3);
    assert_eq!(report.sessions_used, 1);
    assert_eq!(report.rotations, 0);
    assert_eq!(coordinator.rotator().session().request_count, 4);
}

#[tokio::test]
async fn test_scheduled_rotation_replaces_sessions() {
    let server = MockServer::start().await;
    let paths = ["/a/dp/B000000001", "/b/dp/B000000002"];

    mount(&server, "/search/1", search_page(&paths, None)).await;
    for p in paths {
        mount(&server, p, product_page("P", "5.")).await;
    }

    let mut config = create_test_config(&format!("{}/search/1", server.uri()));
    config.session.rotation_enabled = true;
    config.session.min_requests = 1;
    config.session.max_requests = 1;

    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    // Three requests, rotating before the second and the third
    assert_eq!(report.emitted, 2);
    assert_eq!(report.rotations, 2);
    assert_eq!(report.emergency_rotations, 0);
    assert_eq!(report.sessions_used, 3);
}

#[tokio::test]
async fn test_block_signal_on_product_is_retried() {
    let server = MockServer::start().await;

    mount(&server, "/search/1", search_page(&["/a/dp/B000000001"], None)).await;
    Mock::given(method("GET"))
        .and(path("/a/dp/B000000001"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount(&server, "/a/dp/B000000001", product_page("A", "9.")).await;

    let mut config = create_test_config(&format!("{}/search/1", server.uri()));
    config.session.rotation_enabled = true;

    let mut coordinator = Coordinator::new(&config, MemorySink::new()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.emitted, 1);
    assert_eq!(report.product_failures, 0);
    // No proxy, so blocks do not trigger emergency rotation
    assert_eq!(report.emergency_rotations, 0);
}

/// Reports a proxy but connects directly to the mock server
struct DirectProxyIdentity;

impl IdentityProvider for DirectProxyIdentity {
    fn user_agent(&self) -> String {
        "shelf-scout-test".to_string()
    }

    fn proxy_url(&self, _session_id: &str) -> Option<String> {
        None
    }

    fn has_proxy(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn test_block_signal_with_proxy_forces_emergency_rotation() {
    let server = MockServer::start().await;

    mount(&server, "/search/1", search_page(&["/a/dp/B000000001"], None)).await;
    Mock::given(method("GET"))
        .and(path("/a/dp/B000000001"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(&server, "/a/dp/B000000001", product_page("A", "9.")).await;

    let mut config = create_test_config(&format!("{}/search/1", server.uri()));
    config.session.rotation_enabled = true;

    let mut coordinator =
        Coordinator::with_identity(&config, DirectProxyIdentity, MemorySink::new());
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.emitted, 1);
    assert_eq!(report.emergency_rotations, 1);
    assert_eq!(report.rotations, 1);
    assert_eq!(report.sessions_used, 2);
    assert_eq!(coordinator.rotator().session().request_count, 1);
}

#[tokio::test]
async fn test_crawl_writes_dataset_file_and_database() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let dataset_path = dir.path().join("storage/dataset.jsonl");
    let db_path = dir.path().join("storage/dataset.sqlite");

    mount(
        &server,
        "/search/1",
        search_page(&["/a/dp/B000000001", "/b/dp/B000000002"], None),
    )
    .await;
    mount(&server, "/a/dp/B000000001", product_page("A", "12.")).await;
    mount(&server, "/b/dp/B000000002", product_page("B", "250.")).await;

    let config = create_test_config(&format!("{}/search/1", server.uri()));
    let sink = FanoutSink::new()
        .with(JsonLinesSink::open(&dataset_path).unwrap())
        .with(SqliteDataset::open(&db_path, "test-hash").unwrap());

    let mut coordinator = Coordinator::new(&config, sink).unwrap();
    let report = coordinator.run().await.unwrap();
    assert_eq!(report.emitted, 1);
    drop(coordinator);

    let lines = std::fs::read_to_string(&dataset_path).unwrap();
    assert_eq!(lines.lines().count(), 1);
    let record: serde_json::Value = serde_json::from_str(lines.trim()).unwrap();
    assert_eq!(record["asin"], "B000000001");
    assert_eq!(record["price"], 12.0);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_products().unwrap(), 1);
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.emitted, 1);
    assert_eq!(run.stop_reason, Some(StopReason::NoNextPage));
}
