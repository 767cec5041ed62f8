//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from the seed probe to the sitemap files.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sumi_sitemap::config::Config;
use sumi_sitemap::crawler::crawl;
use sumi_sitemap::{Crawler, EngineState, SumiError};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the given server
fn create_test_config(base_url: &str, output_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.seed = Some(format!("{}/", base_url));
    config.crawler.workers = 4;
    config.crawler.connect_timeout = 2;
    config.crawler.request_timeout = 5;
    config.output.directory = output_dir.path().display().to_string();
    config
}

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts a page that must never be requested
async fn mount_forbidden(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(server)
        .await;
}

/// Tracks how many requests a raw server is handling at once
#[derive(Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
    served: AtomicUsize,
}

/// Starts a raw HTTP server that answers every request with `respond(path)`
///
/// Each request is held for `delay` before the response is written. Serves
/// responses wiremock cannot produce, such as a body shorter than its
/// `Content-Length`.
async fn start_raw_server(
    respond: fn(&str) -> Vec<u8>,
    delay: Duration,
) -> (String, Arc<InFlight>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let in_flight = Arc::new(InFlight::default());

    let tracker = Arc::clone(&in_flight);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move {
                let mut request = vec![0u8; 4096];
                let n = socket.read(&mut request).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&request[..n]);
                let route = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                let now = tracker.current.fetch_add(1, Ordering::SeqCst) + 1;
                tracker.peak.fetch_max(now, Ordering::SeqCst);
                tracker.served.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                // Decremented while the client still holds its fetch permit
                tracker.current.fetch_sub(1, Ordering::SeqCst);

                let _ = socket.write_all(&respond(&route)).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), in_flight)
}

fn raw_response(body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes()
}

fn sitemap_locs(crawler: &Crawler) -> Vec<String> {
    crawler
        .sitemap_records()
        .into_iter()
        .map(|record| record.loc)
        .collect()
}

#[tokio::test]
async fn test_full_crawl_writes_sitemap() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<html><body>
            <a href="/page1">Page 1</a>
            <a href="page2">Page 2</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<html><body><a href="/page1/deep">Deep</a></body></html>"#,
    )
    .await;
    mount_page(&mock_server, "/page2", "<html><body>Two</body></html>").await;
    mount_page(&mock_server, "/page1/deep", "<html><body>Deep</body></html>").await;

    let config = create_test_config(&base_url, &output);
    let (stats, files) = crawl(config).await.expect("crawl failed");

    assert_eq!(stats.stop_reason, EngineState::Draining);
    assert_eq!(stats.pages_in_sitemap, 4);
    assert_eq!(stats.urls_claimed, 4);

    let host = url::Url::parse(&base_url)
        .unwrap()
        .host_str()
        .unwrap()
        .to_string();
    assert_eq!(files, vec![output.path().join(format!("{}.xml", host))]);

    let xml = fs::read_to_string(&files[0]).unwrap();
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
    assert!(xml.contains(r#"<sitemapindex xmlns="http://www.google.com/schemas/sitemap/0.84">"#));
    for route in ["/", "/page1", "/page2", "/page1/deep"] {
        let loc = format!("<loc>{}{}</loc>", base_url, route);
        assert_eq!(xml.matches(&loc).count(), 1, "missing {}", loc);
    }
}

#[tokio::test]
async fn test_foreign_and_mailto_links_are_dropped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/about">About</a>
           <a href="mailto:x@y.com">Mail</a>
           <a href="tel:+123">Call</a>
           <a href="https://other.example/z">Elsewhere</a>
           <a href="javascript:void(0)">Nothing</a>"#,
    )
    .await;
    mount_page(&mock_server, "/about", "<p>About us</p>").await;

    let mut crawler = Crawler::new(create_test_config(&base_url, &output)).unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(
        sitemap_locs(&crawler),
        vec![format!("{}/", base_url), format!("{}/about", base_url)]
    );
    assert_eq!(stats.links_seen, 5);
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin\n"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/",
        r#"<a href="/admin/panel">Admin</a><a href="/public">Public</a>"#,
    )
    .await;
    mount_page(&mock_server, "/public", "<p>Public</p>").await;
    mount_forbidden(&mock_server, "/admin/panel").await;

    let mut config = create_test_config(&base_url, &output);
    config.crawler.parse_robots = true;

    let mut crawler = Crawler::new(config).unwrap();
    let stats = crawler.run().await.unwrap();

    assert!(!sitemap_locs(&crawler).contains(&format!("{}/admin/panel", base_url)));
    assert_eq!(stats.pages_in_sitemap, 2);
    assert_eq!(stats.excluded, 1);
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", r#"<a href="/open">Open</a>"#).await;
    mount_page(&mock_server, "/open", "<p>Open</p>").await;

    let mut crawler = Crawler::new(create_test_config(&base_url, &output)).unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.pages_in_sitemap, 2);
}

#[tokio::test]
async fn test_zero_max_urls_fetches_nothing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_forbidden(&mock_server, "/").await;
    mount_forbidden(&mock_server, "/about").await;

    let mut config = create_test_config(&base_url, &output);
    config.crawler.max_urls = 0;

    let mut crawler = Crawler::new(config).unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.stop_reason, EngineState::Capped);
    assert_eq!(stats.pages_in_sitemap, 0);
    assert!(crawler.write_sitemap().unwrap().is_empty());
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_max_urls_caps_the_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    let links: String = (0..20)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_page(&mock_server, "/", &links).await;
    for i in 0..20 {
        mount_page(&mock_server, &format!("/p{}", i), "<p>leaf</p>").await;
    }

    let mut config = create_test_config(&base_url, &output);
    config.crawler.max_urls = 5;

    let mut crawler = Crawler::new(config).unwrap();
    let stats = crawler.run().await.unwrap();

    // Round one fetches the seed and queues five links before the cap trips.
    // Round two fetches four of them; the fifth claim exceeds the cap.
    assert_eq!(stats.stop_reason, EngineState::Capped);
    assert_eq!(stats.rounds, 2);
    assert_eq!(stats.urls_claimed, 6);
    assert_eq!(stats.pages_in_sitemap, 5);
}

#[tokio::test]
async fn test_excluded_substrings_are_never_fetched() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/private/data">Private</a><a href="/docs?print=1">Print</a><a href="/docs">Docs</a>"#,
    )
    .await;
    mount_page(&mock_server, "/docs", "<p>Docs</p>").await;
    mount_forbidden(&mock_server, "/private/data").await;

    let mut config = create_test_config(&base_url, &output);
    config.crawler.exclude = vec!["/private".to_string(), "?print=".to_string()];

    let mut crawler = Crawler::new(config).unwrap();
    crawler.run().await.unwrap();

    assert_eq!(
        sitemap_locs(&crawler),
        vec![format!("{}/", base_url), format!("{}/docs", base_url)]
    );
}

#[tokio::test]
async fn test_rejected_status_and_redirects_stay_out_of_sitemap() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/moved">Moved</a><a href="/broken">Broken</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/elsewhere"))
        .mount(&mock_server)
        .await;
    mount_forbidden(&mock_server, "/elsewhere").await;

    let mut crawler = Crawler::new(create_test_config(&base_url, &output)).unwrap();
    crawler.run().await.unwrap();

    let locs = sitemap_locs(&crawler);
    assert!(!locs.contains(&format!("{}/missing", base_url)));
    assert!(!locs.contains(&format!("{}/broken", base_url)));
    // 301 is inside the accepted range and redirects are not followed
    assert!(locs.contains(&format!("{}/moved", base_url)));
}

#[tokio::test]
async fn test_last_modified_is_recorded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/dated">Dated</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/dated"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<p>Dated</p>")
                .insert_header("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
        )
        .mount(&mock_server)
        .await;

    let mut crawler = Crawler::new(create_test_config(&base_url, &output)).unwrap();
    crawler.run().await.unwrap();
    let files = crawler.write_sitemap().unwrap();

    let records = crawler.sitemap_records();
    let dated = records
        .iter()
        .find(|r| r.loc.ends_with("/dated"))
        .expect("dated page in sitemap");
    assert_eq!(
        dated.lastmod.as_deref(),
        Some("Wed, 21 Oct 2015 07:28:00 GMT")
    );

    let xml = fs::read_to_string(&files[0]).unwrap();
    assert!(xml.contains("<lastmod>Wed, 21 Oct 2015 07:28:00 GMT</lastmod>"));
    assert_eq!(xml.matches("<lastmod>").count(), 1);
}

#[tokio::test]
async fn test_shared_link_is_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a">A</a><a href="/b">B</a><a href="/shared">S</a>"#,
    )
    .await;
    mount_page(&mock_server, "/a", r#"<a href="/shared">S</a><a href="/b">B</a>"#).await;
    mount_page(&mock_server, "/b", r#"<a href="/shared#top">S</a><a href="/a">A</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/a">A</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut crawler = Crawler::new(create_test_config(&base_url, &output)).unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.pages_in_sitemap, 4);
    let locs = sitemap_locs(&crawler);
    let shared = format!("{}/shared", base_url);
    assert_eq!(locs.iter().filter(|l| **l == shared).count(), 1);
}

#[tokio::test]
async fn test_non_html_extensions_are_not_requested() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/report.pdf">PDF</a><a href="/photo.JPG">Photo</a><a href="/page">Page</a>"#,
    )
    .await;
    mount_page(&mock_server, "/page", "<p>Page</p>").await;
    mount_forbidden(&mock_server, "/report.pdf").await;
    mount_forbidden(&mock_server, "/photo.JPG").await;

    let mut crawler = Crawler::new(create_test_config(&base_url, &output)).unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.pages_in_sitemap, 2);
    assert_eq!(stats.urls_claimed, 4);
}

#[tokio::test]
async fn test_validate_seed_fails_when_unreachable() {
    let output = TempDir::new().unwrap();
    let mut config = create_test_config("http://127.0.0.1:1", &output);
    config.crawler.connect_timeout = 1;

    let crawler = Crawler::new(config).unwrap();
    let result = crawler.validate_seed().await;
    assert!(matches!(result, Err(SumiError::Http { .. })));
}

#[tokio::test]
async fn test_validate_seed_accepts_error_status() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(create_test_config(&mock_server.uri(), &output)).unwrap();
    assert!(crawler.validate_seed().await.is_ok());
}

#[tokio::test]
async fn test_crawler_runs_only_once() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/", "<p>Home</p>").await;

    let mut crawler = Crawler::new(create_test_config(&mock_server.uri(), &output)).unwrap();
    crawler.run().await.unwrap();
    assert_eq!(crawler.engine_state(), EngineState::Done);

    let second = crawler.run().await;
    assert!(matches!(
        second,
        Err(SumiError::InvalidTransition {
            from: EngineState::Done,
            to: EngineState::Running
        })
    ));
}

#[tokio::test]
async fn test_truncated_body_is_dropped_but_not_excluded() {
    fn respond(route: &str) -> Vec<u8> {
        match route {
            "/" => raw_response(r#"<a href="/truncated">T</a><a href="/fine">F</a>"#),
            "/truncated" => {
                b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\nabc".to_vec()
            }
            _ => raw_response("<p>fine</p>"),
        }
    }

    let (base_url, _) = start_raw_server(respond, Duration::ZERO).await;
    let output = TempDir::new().unwrap();

    let mut crawler = Crawler::new(create_test_config(&base_url, &output)).unwrap();
    let stats = crawler.run().await.unwrap();

    let locs = sitemap_locs(&crawler);
    assert!(!locs.contains(&format!("{}/truncated", base_url)));
    assert!(locs.contains(&format!("{}/fine", base_url)));
    assert_eq!(stats.pages_in_sitemap, 2);
    assert_eq!(stats.excluded, 0);
}

#[tokio::test]
async fn test_workers_bound_requests_in_flight() {
    fn respond(route: &str) -> Vec<u8> {
        if route == "/" {
            let links: String = (0..20)
                .map(|i| format!(r#"<a href="/leaf{}">{}</a>"#, i, i))
                .collect();
            raw_response(&links)
        } else {
            raw_response("<p>leaf</p>")
        }
    }

    let (base_url, in_flight) = start_raw_server(respond, Duration::from_millis(100)).await;
    let output = TempDir::new().unwrap();

    let mut config = create_test_config(&base_url, &output);
    config.crawler.workers = 3;

    let mut crawler = Crawler::new(config).unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.pages_in_sitemap, 21);
    assert_eq!(in_flight.served.load(Ordering::SeqCst), 21);
    let peak = in_flight.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak of {} requests in flight", peak);
    assert!(peak >= 2, "leaves were fetched one at a time");
}
