//! Search orchestration against a mocked megapeer
//!
//! These tests cover pagination fan-out, the no-results path, the timeout
//! retry and the error records produced for network failures.

use crate::common::{html, megapeer_page, state_paths, test_config};
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;
use tracker_scout::config::Config;
use tracker_scout::output::CollectingSink;
use tracker_scout::trackers::{Engine, Megapeer};
use tracker_scout::{RunContext, SearchCategory};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn megapeer_engine(server: &MockServer, config: &Config, dir: &TempDir) -> Engine<Megapeer> {
    let base = format!("{}/", server.uri());
    let download = format!("{}/download/", server.uri());
    let tracker = Megapeer::with_urls(&base, &download).unwrap();
    Engine::new(tracker, config, state_paths(dir.path(), "megapeer")).unwrap()
}

#[tokio::test]
async fn test_pagination_fans_out_remaining_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .and(query_param("page", "1"))
        .respond_with(html(&megapeer_page(None, 51..=100)))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .and(query_param("page", "2"))
        .respond_with(html(&megapeer_page(None, 101..=120)))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    // First page; every request carries the tracker's Referer
    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .and(query_param("search", "doctor"))
        .and(header("referer", format!("{}/browse.php", server.uri()).as_str()))
        .respond_with(html(&megapeer_page(Some(120), 1..=50)))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = megapeer_engine(&server, &test_config(), &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    let summary = engine
        .search(&mut ctx, "doctor", SearchCategory::All, &mut sink)
        .await
        .expect("search should succeed");

    assert_eq!(summary.total, 120);
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.emitted, 120);
    assert_eq!(summary.failed_pages, 0);
    assert!(!ctx.has_failed());

    let links: HashSet<&str> = sink.records.iter().map(|r| r.link.as_str()).collect();
    assert_eq!(links.len(), 120);
    assert!(sink.records.iter().all(|r| !r.name.contains("[Error]")));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_single_page_needs_no_fan_out() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(html(&megapeer_page(Some(50), 1..=50)))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = megapeer_engine(&server, &test_config(), &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    let summary = engine
        .search(&mut ctx, "doctor", SearchCategory::All, &mut sink)
        .await
        .unwrap();
    assert_eq!(summary.pages, 1);
    assert_eq!(sink.records.len(), 50);
}

#[tokio::test]
async fn test_category_code_in_query() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .and(query_param("cat", "107"))
        .respond_with(html(&megapeer_page(Some(1), 1..=1)))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = megapeer_engine(&server, &test_config(), &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    engine
        .search(&mut ctx, "office", SearchCategory::Software, &mut sink)
        .await
        .unwrap();
    assert_eq!(sink.records.len(), 1);
    assert_eq!(sink.records[0].seeds, Some(100));
}

#[tokio::test]
async fn test_no_results_is_not_an_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(html("<html><body><p>Ничего не найдено</p></body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = megapeer_engine(&server, &test_config(), &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    let summary = engine
        .search(&mut ctx, "zzzz", SearchCategory::All, &mut sink)
        .await
        .expect("no results is a successful search");

    assert_eq!(summary.total, 0);
    assert!(sink.records.is_empty());
    assert!(!ctx.has_failed());
}

#[tokio::test]
async fn test_failed_page_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .and(query_param("page", "1"))
        .respond_with(html(&megapeer_page(None, 51..=100)))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(html(&megapeer_page(Some(120), 1..=50)))
        .mount(&server)
        .await;

    let mut engine = megapeer_engine(&server, &test_config(), &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    let summary = engine
        .search(&mut ctx, "doctor", SearchCategory::All, &mut sink)
        .await
        .unwrap();

    assert_eq!(summary.failed_pages, 1);
    assert_eq!(sink.records.len(), 100);
    assert!(!ctx.has_failed());
}

#[tokio::test]
async fn test_timeout_is_retried_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(html(&megapeer_page(Some(2), 1..=2)).set_delay(Duration::from_secs(3)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(html(&megapeer_page(Some(2), 1..=2)))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        timeout_secs: 1,
        ..test_config()
    };
    let mut engine = megapeer_engine(&server, &config, &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    let summary = engine
        .search(&mut ctx, "doctor", SearchCategory::All, &mut sink)
        .await
        .expect("the retry should succeed");

    assert_eq!(summary.emitted, 2);
    assert_eq!(sink.records.len(), 2);
}

#[tokio::test]
async fn test_second_timeout_reports_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(html(&megapeer_page(Some(2), 1..=2)).set_delay(Duration::from_secs(3)))
        .expect(2)
        .mount(&server)
        .await;

    let config = Config {
        timeout_secs: 1,
        ..test_config()
    };
    let mut engine = megapeer_engine(&server, &config, &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    let summary = engine
        .search(&mut ctx, "doctor", SearchCategory::All, &mut sink)
        .await;

    assert!(summary.is_none());
    assert_eq!(sink.records.len(), 1);
    let record = &sink.records[0];
    assert!(record.name.starts_with("[doctor][Error]: "));
    assert!(record.name.contains("timed out"));
    assert_eq!(record.link, format!("{}/error", server.uri()));
    // The error is reported once and cleared
    assert!(!ctx.has_failed());
}

#[tokio::test]
async fn test_status_error_record() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = megapeer_engine(&server, &test_config(), &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    engine
        .search(&mut ctx, "doctor", SearchCategory::All, &mut sink)
        .await;

    assert_eq!(sink.records.len(), 1);
    assert!(sink.records[0].name.contains("failed with status: 503"));
    assert_eq!(sink.records[0].size, "1 TB");
}

#[tokio::test]
async fn test_redirect_off_origin_is_blocked() {
    let server = MockServer::start().await;
    let block_page = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/stub"))
        .respond_with(html("<html><body>Access restricted</body></html>"))
        .mount(&block_page)
        .await;

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/stub", block_page.uri()).as_str()),
        )
        .mount(&server)
        .await;

    let mut engine = megapeer_engine(&server, &test_config(), &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    engine
        .search(&mut ctx, "doctor", SearchCategory::All, &mut sink)
        .await;

    assert_eq!(sink.records.len(), 1);
    assert!(sink.records[0].name.contains("is blocked. Try another proxy."));
}

#[tokio::test]
async fn test_unrecognized_first_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(html("<html><body>Cloudflare says hi</body></html>"))
        .mount(&server)
        .await;

    let mut engine = megapeer_engine(&server, &test_config(), &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    engine
        .search(&mut ctx, "doctor", SearchCategory::All, &mut sink)
        .await;

    assert_eq!(sink.records.len(), 1);
    assert!(sink.records[0].name.contains("Unexpected page content"));
}

#[tokio::test]
async fn test_download_keeps_torrent_file() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let payload = b"d8:announce13:http://t/anne".to_vec();

    Mock::given(method("GET"))
        .and(path("/download/7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = megapeer_engine(&server, &test_config(), &dir);
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();
    let url = format!("{}/download/7", server.uri());

    let file = engine
        .download(&mut ctx, &url, &mut sink)
        .await
        .expect("download should succeed");

    assert!(sink.records.is_empty());
    assert_eq!(file.url, url);
    assert_eq!(file.path.extension().unwrap(), "torrent");
    assert_eq!(std::fs::read(&file.path).unwrap(), payload);
    assert_eq!(file.to_string(), format!("{} {}", file.path.display(), url));

    std::fs::remove_file(&file.path).unwrap();
}

#[tokio::test]
async fn test_proxy_enabled_without_urls() {
    let mut config = test_config();
    config.proxy = true;

    let dir = TempDir::new().unwrap();
    let result = Engine::new(Megapeer::new(), &config, state_paths(dir.path(), "megapeer"));

    let Err(error) = result else {
        panic!("engine should not build without proxy URLs");
    };
    assert!(error.is_fatal());
}
