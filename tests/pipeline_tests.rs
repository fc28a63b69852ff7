mod common;

use proxy_sweep::{Config, Paths, Pipeline};
use std::fs;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> Config {
    let mut config = Config::default();
    config.scraper.timeout = Some(5);
    config.checker.test_url = Some("http://egress.test/".to_string());
    config.checker.timeout = Some(3);
    config.checker.connect_timeout = Some(2);
    config
}

#[tokio::test]
async fn test_full_run_merges_previous_and_keeps_working() {
    let proxy_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7\n"))
        .mount(&proxy_server)
        .await;
    let working = proxy_server.address().to_string();
    let dead = common::dead_addresses(2).await;
    let (scraped_dead, previous_dead) = (&dead[0], &dead[1]);

    let sources = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/http.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    "{}\n{}\nnot a proxy\n{}\n",
                    working, scraped_dead, working
                )),
        )
        .mount(&sources)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let sources_dir = dir.path().join("sources");
    let output_dir = dir.path().join("out");
    fs::create_dir_all(&sources_dir).unwrap();
    fs::create_dir_all(&output_dir).unwrap();
    fs::write(
        sources_dir.join("http.txt"),
        format!("# lists\n{}/http.txt\n", sources.uri()),
    )
    .unwrap();
    fs::write(sources_dir.join("socks5.txt"), "").unwrap();
    fs::write(
        output_dir.join("http.txt"),
        format!("{}\n{}\n", previous_dead, working),
    )
    .unwrap();
    fs::write(output_dir.join("socks5.txt"), "9.9.9.9:notaport\n").unwrap();

    let summary = Pipeline::new(
        test_config(),
        Paths {
            sources_dir,
            output_dir: output_dir.clone(),
        },
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.http.total, 3);
    assert_eq!(summary.http.checked, 3);
    assert_eq!(summary.http.working, 1);
    assert_eq!(summary.socks5.total, 0);
    assert!(summary.is_complete());

    assert_eq!(
        fs::read_to_string(output_dir.join("http.txt")).unwrap(),
        format!("{}\n", working)
    );
    assert_eq!(fs::read_to_string(output_dir.join("socks5.txt")).unwrap(), "");
}

#[tokio::test]
async fn test_detailed_run_carries_previous_records() {
    let proxy_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"status":"success","country":"Japan","city":"Tokyo","query":"198.51.100.9"}"#,
        ))
        .mount(&proxy_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/headers"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"headers":{}}"#))
        .mount(&proxy_server)
        .await;
    let working = proxy_server.address().to_string();

    let dir = tempfile::tempdir().unwrap();
    let sources_dir = dir.path().join("sources");
    let output_dir = dir.path().join("out");
    fs::create_dir_all(&sources_dir).unwrap();
    fs::create_dir_all(&output_dir).unwrap();
    fs::write(sources_dir.join("http.txt"), "").unwrap();
    fs::write(sources_dir.join("socks5.txt"), "").unwrap();
    fs::write(
        output_dir.join("http.txt"),
        format!(
            "Proxy|IP|Location|Response Time|Anonymous\n{}|198.51.100.9|Tokyo, Japan|120ms|Yes\n",
            working
        ),
    )
    .unwrap();

    let mut config = test_config();
    config.checker.strict_check = true;
    config.checker.detailed_output = true;
    config.checker.geo_url = Some("http://geo.test/json".to_string());
    config.checker.headers_url = Some("http://echo.test/headers".to_string());

    let summary = Pipeline::new(
        config,
        Paths {
            sources_dir,
            output_dir: output_dir.clone(),
        },
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.http.checked, 1);
    assert_eq!(summary.http.working, 1);

    let content = fs::read_to_string(output_dir.join("http.txt")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Proxy|IP|Location|Response Time|Anonymous");
    assert!(lines[1].starts_with(&format!("{}|198.51.100.9|Tokyo, Japan|", working)));
    assert!(lines[1].ends_with("|Yes"));
    assert_eq!(
        fs::read_to_string(output_dir.join("socks5.txt")).unwrap(),
        "Proxy|IP|Location|Response Time|Anonymous\n"
    );
}

#[tokio::test]
async fn test_missing_socks5_sources_abort_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let sources_dir = dir.path().join("sources");
    let output_dir = dir.path().join("out");
    fs::create_dir_all(&sources_dir).unwrap();
    fs::write(sources_dir.join("http.txt"), "").unwrap();

    let result = Pipeline::new(Config::default(), Paths { sources_dir, output_dir: output_dir.clone() })
        .run()
        .await;

    assert!(result.is_err());
    assert!(!output_dir.exists());
}
