mod common;

use parking_lot::Mutex;
use proxy_sweep::{CrawlerConfig, ParseOptions, ProgressObserver, ProxyCrawler, ProxyType};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingObserver {
    finished: Mutex<Vec<(ProxyType, usize, usize, usize)>>,
}

impl ProgressObserver for RecordingObserver {
    fn scrape_finished(&self, proxy_type: ProxyType, found: usize, completed: usize, total: usize) {
        self.finished.lock().push((proxy_type, found, completed, total));
    }
}

fn crawler(user_agents: &[&str]) -> ProxyCrawler {
    let config = CrawlerConfig::new()
        .with_timeout(Duration::from_secs(5))
        .with_user_agents(user_agents.iter().map(|ua| ua.to_string()).collect())
        .with_concurrency(2);
    ProxyCrawler::with_config(config).unwrap()
}

fn sorted(mut proxies: Vec<String>) -> Vec<String> {
    proxies.sort();
    proxies
}

#[tokio::test]
async fn test_crawl_mixed_source_formats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "# free proxies\n\
             1.2.3.4:8080\n\
             http://5.6.7.8:3128\n\
             garbage line\n\
             {\"data\":[{\"ip\":\"9.9.9.9\",\"port\":\"1080\"}]}\n\
             \n\
             10.0.0.1:80 elite proxy\n",
        ))
        .mount(&server)
        .await;

    let urls = vec![format!("{}/list.txt", server.uri())];
    let proxies = crawler(&["agent"]).crawl_sources(&urls, ProxyType::Http).await;

    assert_eq!(
        proxies,
        vec!["1.2.3.4:8080", "5.6.7.8:3128", "9.9.9.9:1080", "10.0.0.1:80"]
    );
}

#[tokio::test]
async fn test_user_agents_rotate_by_source_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .and(header("user-agent", "agent-a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1.1.1.1:80\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .and(header("user-agent", "agent-b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2.2.2.2:80\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .and(header("user-agent", "agent-a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("3.3.3.3:80\n"))
        .mount(&server)
        .await;

    let urls: Vec<String> = ["/a", "/b", "/c"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();
    let proxies = crawler(&["agent-a", "agent-b"])
        .crawl_sources(&urls, ProxyType::Http)
        .await;

    assert_eq!(sorted(proxies), vec!["1.1.1.1:80", "2.2.2.2:80", "3.3.3.3:80"]);
}

#[tokio::test]
async fn test_failing_sources_contribute_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/good"))
        .respond_with(ResponseTemplate::new(200).set_body_string("4.4.4.4:1080\n"))
        .mount(&server)
        .await;

    let observer = Arc::new(RecordingObserver::default());
    let crawler = crawler(&["agent"]).with_observer(observer.clone());

    let urls = vec![
        format!("http://{}/list.txt", common::dead_address().await),
        format!("{}/good", server.uri()),
        "not a url".to_string(),
    ];
    let proxies = crawler.crawl_sources(&urls, ProxyType::Socks5).await;

    assert_eq!(proxies, vec!["4.4.4.4:1080"]);
    assert_eq!(
        *observer.finished.lock(),
        vec![(ProxyType::Socks5, 1, 3, 3)]
    );
}

#[tokio::test]
async fn test_error_status_body_is_still_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("6.6.6.6:8080\n"))
        .mount(&server)
        .await;

    let urls = vec![server.uri()];
    let proxies = crawler(&["agent"]).crawl_sources(&urls, ProxyType::Http).await;

    assert_eq!(proxies, vec!["6.6.6.6:8080"]);
}

#[tokio::test]
async fn test_loose_parsing_is_opt_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("port 8080 on 7.7.7.7\n"))
        .mount(&server)
        .await;
    let urls = vec![server.uri()];

    let proxies = crawler(&["agent"]).crawl_sources(&urls, ProxyType::Http).await;
    assert!(proxies.is_empty());

    let config = CrawlerConfig::new().with_parse_options(ParseOptions {
        loose_fallback: true,
        strict_ranges: false,
    });
    let proxies = ProxyCrawler::with_config(config)
        .unwrap()
        .crawl_sources(&urls, ProxyType::Http)
        .await;
    assert_eq!(proxies, vec!["7.7.7.7:8080"]);
}
