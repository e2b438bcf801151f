//! Category resolution and its on-disk cache

use crate::common::{
    html, rutracker_page, state_paths, test_config, write_session_cookie, RUTRACKER_LOGIN_PAGE,
    RUTRACKER_PICKER,
};
use tempfile::TempDir;
use tracker_scout::output::CollectingSink;
use tracker_scout::taxonomy::TaxonomyCache;
use tracker_scout::trackers::{Engine, Rutracker};
use tracker_scout::{RunContext, SearchCategory};
use wiremock::matchers::{header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fresh_cache_is_reused_across_engines() {
    let server = MockServer::start().await;
    let forum = format!("{}/forum/", server.uri());
    let dir = TempDir::new().unwrap();
    let paths = state_paths(dir.path(), "rutracker");
    write_session_cookie(&forum, &paths.cookie_file);

    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .and(query_param("nm", "ABCDZASDFEFCS"))
        .respond_with(html(RUTRACKER_PICKER))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .and(query_param("nm", "ubuntu"))
        .and(query_param("f", "7,187"))
        .respond_with(html(&rutracker_page(1, 1..=1)))
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..2 {
        let tracker = Rutracker::with_base_url(&forum).unwrap();
        let mut engine = Engine::new(tracker, &test_config(), paths.clone()).unwrap();
        let mut ctx = RunContext::new();
        let mut sink = CollectingSink::new();

        engine
            .search(&mut ctx, "ubuntu", SearchCategory::Movies, &mut sink)
            .await
            .expect("search should succeed");
        assert_eq!(sink.records.len(), 1);
        assert_eq!(engine.category_code(SearchCategory::Movies), "7,187");
    }

    let cache = TaxonomyCache::load(&paths.cache_file).unwrap().unwrap();
    assert_eq!(cache.codes.get(&SearchCategory::Movies).unwrap(), "7,187");
    assert!(!cache.is_stale());
}

#[tokio::test]
async fn test_unresolved_category_keeps_static_code() {
    let server = MockServer::start().await;
    let forum = format!("{}/forum/", server.uri());
    let dir = TempDir::new().unwrap();
    let paths = state_paths(dir.path(), "rutracker");
    write_session_cookie(&forum, &paths.cookie_file);

    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .and(query_param("nm", "ABCDZASDFEFCS"))
        .respond_with(html(RUTRACKER_PICKER))
        .mount(&server)
        .await;

    // The picker has no software group
    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .and(query_param("nm", "gimp"))
        .and(query_param("f", "-1"))
        .respond_with(html(&rutracker_page(1, 1..=1)))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = Rutracker::with_base_url(&forum).unwrap();
    let mut engine = Engine::new(tracker, &test_config(), paths).unwrap();
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    engine
        .search(&mut ctx, "gimp", SearchCategory::Software, &mut sink)
        .await
        .expect("search should succeed");
    assert_eq!(sink.records.len(), 1);
}

#[tokio::test]
async fn test_picker_failure_is_reported() {
    let server = MockServer::start().await;
    let forum = format!("{}/forum/", server.uri());
    let dir = TempDir::new().unwrap();
    let paths = state_paths(dir.path(), "rutracker");
    write_session_cookie(&forum, &paths.cookie_file);

    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = Rutracker::with_base_url(&forum).unwrap();
    let mut engine = Engine::new(tracker, &test_config(), paths.clone()).unwrap();
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    let summary = engine
        .search(&mut ctx, "ubuntu", SearchCategory::Movies, &mut sink)
        .await;

    assert!(summary.is_none());
    assert_eq!(sink.records.len(), 1);
    assert!(sink.records[0].name.contains("502"));
    assert!(!paths.cache_file.exists());
}

#[tokio::test]
async fn test_lost_session_on_picker_page_logs_in_again() {
    let server = MockServer::start().await;
    let forum = format!("{}/forum/", server.uri());
    let dir = TempDir::new().unwrap();
    let paths = state_paths(dir.path(), "rutracker");
    write_session_cookie(&forum, &paths.cookie_file);

    // The stored cookie is stale: the picker comes back as the login form once
    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .and(query_param("nm", "ABCDZASDFEFCS"))
        .respond_with(html(RUTRACKER_LOGIN_PAGE))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/forum/login.php"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "bb_session=renewed; path=/forum/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .and(query_param("nm", "ABCDZASDFEFCS"))
        .and(header_regex("cookie", r"(^|; )bb_session=renewed(;|$)"))
        .respond_with(html(RUTRACKER_PICKER))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .and(query_param("nm", "ubuntu"))
        .and(query_param("f", "7,187"))
        .respond_with(html(&rutracker_page(1, 1..=1)))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = Rutracker::with_base_url(&forum).unwrap();
    let mut engine = Engine::new(tracker, &test_config(), paths.clone()).unwrap();
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    engine
        .search(&mut ctx, "ubuntu", SearchCategory::Movies, &mut sink)
        .await
        .expect("search should succeed");

    assert_eq!(sink.records.len(), 1);
    assert_eq!(engine.session().unwrap().login_attempts(), 1);
    let cache = TaxonomyCache::load(&paths.cache_file).unwrap().unwrap();
    assert_eq!(cache.codes.get(&SearchCategory::Movies).unwrap(), "7,187");
}

#[tokio::test]
async fn test_picker_behind_login_form_is_reported_and_not_cached() {
    let server = MockServer::start().await;
    let forum = format!("{}/forum/", server.uri());
    let dir = TempDir::new().unwrap();
    let paths = state_paths(dir.path(), "rutracker");
    write_session_cookie(&forum, &paths.cookie_file);

    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .and(query_param("nm", "ABCDZASDFEFCS"))
        .respond_with(html(RUTRACKER_LOGIN_PAGE))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/forum/login.php"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "bb_session=useless; path=/forum/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tracker = Rutracker::with_base_url(&forum).unwrap();
    let mut engine = Engine::new(tracker, &test_config(), paths.clone()).unwrap();
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    let summary = engine
        .search(&mut ctx, "ubuntu", SearchCategory::Movies, &mut sink)
        .await;

    assert!(summary.is_none());
    assert_eq!(sink.records.len(), 1);
    assert!(sink.records[0].name.contains("not authorized"));
    assert!(!paths.cache_file.exists());
}

#[tokio::test]
async fn test_page_without_picker_is_not_cached() {
    let server = MockServer::start().await;
    let forum = format!("{}/forum/", server.uri());
    let dir = TempDir::new().unwrap();
    let paths = state_paths(dir.path(), "rutracker");
    write_session_cookie(&forum, &paths.cookie_file);

    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .and(query_param("nm", "ABCDZASDFEFCS"))
        .respond_with(html("<html><body><a class=\"log-out-icon\"></a></body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forum/tracker.php"))
        .and(query_param("nm", "ubuntu"))
        .and(query_param("f", "-1"))
        .respond_with(html(&rutracker_page(1, 1..=1)))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = Rutracker::with_base_url(&forum).unwrap();
    let mut engine = Engine::new(tracker, &test_config(), paths.clone()).unwrap();
    let mut ctx = RunContext::new();
    let mut sink = CollectingSink::new();

    engine
        .search(&mut ctx, "ubuntu", SearchCategory::Movies, &mut sink)
        .await
        .expect("search should succeed");

    assert_eq!(sink.records.len(), 1);
    assert_eq!(engine.category_code(SearchCategory::Movies), "-1");
    assert!(!paths.cache_file.exists());
}
