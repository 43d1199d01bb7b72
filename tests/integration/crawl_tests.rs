//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full crawl
//! cycles end-to-end against a real SQLite file and content directory.

use recrawl::cache::{ChangeCache, MemoryCache};
use recrawl::config::{
    Config, CrawlerConfig, FreshnessStrategy, OutputConfig, RetryConfig, StoreConfig, SyncConfig,
};
use recrawl::crawler::{Coordinator, Scheduler};
use recrawl::storage::{lock, open_shared, CrawlRecord, SharedStorage, Storage};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_link: format!("{}/wiki/Main_Page", server.uri()),
            link_prefix: "/wiki/".to_string(),
            max_workers: 4,
            max_links_per_cycle: 100,
            request_timeout_ms: 2000,
            freshness: FreshnessStrategy::LastModified,
            user_agent: "TestCrawler/1.0".to_string(),
        },
        retry: RetryConfig {
            max_attempts: 3,
            delay_ms: 5, // Very short for testing
            backoff_multiplier: 1.0,
        },
        sync: SyncConfig {
            cycle_interval_secs: 3600,
            poll_interval_secs: 1,
        },
        output: OutputConfig {
            directory: dir.path().join("pages").to_string_lossy().to_string(),
        },
        store: StoreConfig {
            database_path: dir.path().join("recrawl.db").to_string_lossy().to_string(),
        },
    }
}

fn open_store(config: &Config) -> SharedStorage {
    open_shared(Path::new(&config.store.database_path)).unwrap()
}

fn coordinator(config: &Config, cache: Arc<dyn ChangeCache>, storage: SharedStorage) -> Coordinator {
    Coordinator::new(config, Client::new(), cache, storage).unwrap()
}

fn stored_records(storage: &SharedStorage) -> Vec<CrawlRecord> {
    let mut records = Vec::new();
    lock(storage)
        .unwrap()
        .for_each_record(&mut |record| records.push(record))
        .unwrap();
    records
}

async fn mount_seed(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/wiki/Main_Page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_head(server: &MockServer, page: &str, last_modified: &str) {
    Mock::given(method("HEAD"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).insert_header("Last-Modified", last_modified))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_changed_page_is_downloaded_once() {
    let server = MockServer::start().await;
    mount_seed(&server, "<a href='/wiki/Car'>Car</a>").await;
    mount_head(&server, "/wiki/Car", "D1").await;
    Mock::given(method("GET"))
        .and(path("/wiki/Car"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let storage = open_store(&config);
    let cache: Arc<dyn ChangeCache> = Arc::new(MemoryCache::new());
    let coordinator = coordinator(&config, cache.clone(), storage.clone());
    let shutdown = CancellationToken::new();

    // First cycle downloads the page
    let report = coordinator.run_cycle(&shutdown).await;
    assert_eq!(report.discovered, 1);
    assert_eq!(report.saved, 1);
    assert_eq!(report.flushed, 1);

    let page = dir.path().join("pages").join("Car.html");
    assert_eq!(std::fs::read_to_string(&page).unwrap(), "content");

    let link = format!("{}/wiki/Car", server.uri());
    assert_eq!(
        stored_records(&storage),
        vec![CrawlRecord {
            link: link.clone(),
            signal: "D1".to_string()
        }]
    );

    // Second cycle sees the same signal: no GET, no rewrite
    std::fs::write(&page, "untouched").unwrap();
    let report = coordinator.run_cycle(&shutdown).await;
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.saved, 0);
    assert_eq!(std::fs::read_to_string(&page).unwrap(), "untouched");
}

#[tokio::test]
async fn test_failed_fetch_is_not_retried_until_signal_changes() {
    let server = MockServer::start().await;
    mount_seed(&server, "<a href='/wiki/Car'>Car</a>").await;
    mount_head(&server, "/wiki/Car", "D2").await;
    Mock::given(method("GET"))
        .and(path("/wiki/Car"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let storage = open_store(&config);
    let cache: Arc<dyn ChangeCache> = Arc::new(MemoryCache::new());
    let coordinator = coordinator(&config, cache.clone(), storage.clone());
    let shutdown = CancellationToken::new();

    let report = coordinator.run_cycle(&shutdown).await;
    assert_eq!(report.fetch_failed, 1);
    assert_eq!(report.flushed, 0);
    assert!(!dir.path().join("pages").join("Car.html").exists());

    let link = format!("{}/wiki/Car", server.uri());
    assert_eq!(cache.lookup(&link).unwrap(), Some("D2".to_string()));
    assert!(stored_records(&storage).is_empty());

    // Same signal on the next cycle: the gate keeps the page from being fetched
    let report = coordinator.run_cycle(&shutdown).await;
    assert_eq!(report.unchanged, 1);
}

#[tokio::test]
async fn test_links_without_signal_are_skipped() {
    let server = MockServer::start().await;
    mount_seed(&server, "<a href='/wiki/Car'>Car</a><a href='/wiki/Bus'>Bus</a>").await;
    mount_head(&server, "/wiki/Car", "D1").await;
    Mock::given(method("HEAD"))
        .and(path("/wiki/Bus"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Car"))
        .respond_with(ResponseTemplate::new(200).set_body_string("car"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Bus"))
        .respond_with(ResponseTemplate::new(200).set_body_string("bus"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let storage = open_store(&config);
    let coordinator = coordinator(&config, Arc::new(MemoryCache::new()), storage.clone());

    let report = coordinator.run_cycle(&CancellationToken::new()).await;

    assert_eq!(report.discovered, 2);
    assert_eq!(report.no_signal, 1);
    assert_eq!(report.saved, 1);
    assert_eq!(stored_records(&storage).len(), 1);
}

#[tokio::test]
async fn test_restart_resumes_from_store() {
    let server = MockServer::start().await;
    mount_seed(&server, "<a href='/wiki/Car'>Car</a>").await;
    mount_head(&server, "/wiki/Car", "D1").await;
    Mock::given(method("GET"))
        .and(path("/wiki/Car"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let shutdown = CancellationToken::new();

    // First process
    {
        let storage = open_store(&config);
        let cache: Arc<dyn ChangeCache> = Arc::new(MemoryCache::new());
        let scheduler = Scheduler::new(
            coordinator(&config, cache.clone(), storage.clone()),
            cache,
            storage,
            &config.sync,
        );
        let report = scheduler.tick(&shutdown).await.unwrap();
        assert_eq!(report.saved, 1);
        assert!(scheduler.tick(&shutdown).await.is_none());
    }

    // Second process with an empty cache; force the cycle to be due
    let storage = open_store(&config);
    lock(&storage).unwrap().set_cycle_timestamp(0).unwrap();
    let cache: Arc<dyn ChangeCache> = Arc::new(MemoryCache::new());
    let scheduler = Scheduler::new(
        coordinator(&config, cache.clone(), storage.clone()),
        cache.clone(),
        storage,
        &config.sync,
    );

    let report = scheduler.tick(&shutdown).await.unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.saved, 0);
    assert_eq!(cache.len().unwrap(), 1);
}

#[tokio::test]
async fn test_cap_across_cycles() {
    let server = MockServer::start().await;
    let seed: String = (0..6)
        .map(|i| format!("<a href=\"/wiki/Page_{}\">p</a>", i))
        .collect();
    mount_seed(&server, &seed).await;
    for i in 0..6 {
        let page = format!("/wiki/Page_{}", i);
        mount_head(&server, &page, "D1").await;
        Mock::given(method("GET"))
            .and(path(page.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("body"))
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_links_per_cycle = 4;
    let storage = open_store(&config);
    let coordinator = coordinator(&config, Arc::new(MemoryCache::new()), storage.clone());

    let report = coordinator.run_cycle(&CancellationToken::new()).await;

    assert_eq!(report.enqueued, 4);
    assert_eq!(report.dropped_by_cap, 2);
    assert_eq!(report.saved, 4);
    assert_eq!(stored_records(&storage).len(), 4);
}

#[tokio::test]
async fn test_content_hash_strategy_skips_identical_body() {
    let server = MockServer::start().await;
    mount_seed(&server, "<a href='/wiki/Car'>Car</a>").await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Car"))
        .respond_with(ResponseTemplate::new(200).set_body_string("same body"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.freshness = FreshnessStrategy::ContentHash;
    let storage = open_store(&config);
    let coordinator = coordinator(&config, Arc::new(MemoryCache::new()), storage.clone());
    let shutdown = CancellationToken::new();

    let first = coordinator.run_cycle(&shutdown).await;
    let second = coordinator.run_cycle(&shutdown).await;

    assert_eq!(first.saved, 1);
    assert_eq!(second.saved, 0);
    assert_eq!(second.unchanged, 1);
}

#[tokio::test]
async fn test_seed_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Main_Page"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_seed(&server, "<a href='/wiki/Car'>Car</a>").await;
    mount_head(&server, "/wiki/Car", "D1").await;
    Mock::given(method("GET"))
        .and(path("/wiki/Car"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let storage = open_store(&config);
    let coordinator = coordinator(&config, Arc::new(MemoryCache::new()), storage);

    let report = coordinator.run_cycle(&CancellationToken::new()).await;
    assert_eq!(report.saved, 1);
}

async fn received(server: &MockServer, verb: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.to_string() == verb)
        .count()
}

#[tokio::test]
async fn test_shutdown_finishes_in_flight_link_and_flushes() {
    let server = MockServer::start().await;
    mount_seed(
        &server,
        "<a href='/wiki/Car'>Car</a><a href='/wiki/Bus'>Bus</a><a href='/wiki/Tram'>Tram</a>",
    )
    .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("Last-Modified", "D1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/wiki/(Car|Bus|Tram)$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow body")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    // A single worker keeps exactly one link in flight
    config.crawler.max_workers = 1;
    let storage = open_store(&config);
    let coordinator = coordinator(&config, Arc::new(MemoryCache::new()), storage.clone());
    let shutdown = CancellationToken::new();

    // Cancel as soon as the first link has been HEADed, while its GET is delayed
    let cancel_after_first_head = async {
        for _ in 0..500 {
            if received(&server, "HEAD").await >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        shutdown.cancel();
    };
    let (report, ()) = tokio::join!(coordinator.run_cycle(&shutdown), cancel_after_first_head);

    assert_eq!(report.enqueued, 3);
    assert_eq!(report.saved, 1);
    assert_eq!(report.processed(), 1);
    assert!(report.interrupted);
    assert_eq!(report.flushed, 1);

    // Links still queued at shutdown were never touched
    assert_eq!(received(&server, "HEAD").await, 1);
    assert_eq!(received(&server, "GET").await, 2);

    let records = stored_records(&storage);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].signal, "D1");
    let name = records[0].link.rsplit('/').next().unwrap().to_string();
    assert_eq!(
        std::fs::read_to_string(dir.path().join("pages").join(format!("{}.html", name))).unwrap(),
        "slow body"
    );
}
