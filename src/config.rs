//! File configuration
//!
//! Every key is optional. Zero values count as unset, and defaults that depend
//! on the checking mode are resolved when the runtime configs are built, so
//! command-line overrides must be applied first.

use crate::proxy::checker::{
    CheckerConfig, DEFAULT_CONCURRENCY as DEFAULT_CHECK_CONCURRENCY, DEFAULT_GEO_URL,
    DEFAULT_HEADERS_URL, DEFAULT_RESULT_BUFFER, DEFAULT_TEST_URL,
};
use crate::proxy::crawler::{
    CrawlerConfig, DEFAULT_CONCURRENCY as DEFAULT_SCRAPE_CONCURRENCY, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};
use crate::proxy::models::ProxyType;
use crate::proxy::parser::ParseOptions;
use crate::Result;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperSection,
    pub checker: CheckerSection,
}

/// `[scraper]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScraperSection {
    /// Request timeout in seconds
    pub timeout: Option<u64>,
    pub user_agent: Option<String>,
    /// Rotated by source index; defaults to `[user_agent]`
    pub user_agents: Vec<String>,
    /// Sources fetched at once
    pub concurrent: Option<usize>,
    /// Pair the first dotted quad with the first digit run when nothing else matches
    pub loose_parsing: bool,
    /// Enforce octet and port ranges on parsed addresses
    pub strict_ranges: bool,
}

/// `[checker]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckerSection {
    /// Response timeout in seconds (3 in strict mode, 10 otherwise)
    pub timeout: Option<u64>,
    /// Connect timeout in seconds (3 in strict mode, 5 otherwise)
    pub connect_timeout: Option<u64>,
    pub concurrent: Option<usize>,
    pub concurrent_http: Option<usize>,
    pub concurrent_socks5: Option<usize>,
    pub check_urls: Vec<String>,
    /// Defaults to the first entry of `check_urls`
    pub test_url: Option<String>,
    /// Defaults to the scraper user agent
    pub user_agent: Option<String>,
    pub strict_check: bool,
    /// Ignored unless `strict_check` is set
    pub detailed_output: bool,
    pub geo_url: Option<String>,
    pub headers_url: Option<String>,
    pub result_buffer: Option<usize>,
}

fn positive<T: Copy + PartialOrd + Default>(value: Option<T>) -> Option<T> {
    value.filter(|v| *v > T::default())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.trim().is_empty()).cloned()
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse configuration")
    }

    /// Load configuration from `path`; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("in {:?}", path))
    }

    fn scraper_user_agent(&self) -> String {
        non_empty(&self.scraper.user_agent).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    /// Runtime configuration for fetching sources
    pub fn crawler_config(&self) -> CrawlerConfig {
        let scraper = &self.scraper;

        let mut user_agents: Vec<String> = scraper
            .user_agents
            .iter()
            .filter(|ua| !ua.trim().is_empty())
            .cloned()
            .collect();
        if user_agents.is_empty() {
            user_agents.push(self.scraper_user_agent());
        }

        CrawlerConfig::new()
            .with_timeout(Duration::from_secs(
                positive(scraper.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .with_user_agents(user_agents)
            .with_concurrency(positive(scraper.concurrent).unwrap_or(DEFAULT_SCRAPE_CONCURRENCY))
            .with_parse_options(ParseOptions {
                loose_fallback: scraper.loose_parsing,
                strict_ranges: scraper.strict_ranges,
            })
    }

    /// Runtime configuration for checking
    pub fn checker_config(&self) -> CheckerConfig {
        let checker = &self.checker;

        let concurrent = positive(checker.concurrent).unwrap_or(DEFAULT_CHECK_CONCURRENCY);
        let test_url = non_empty(&checker.test_url)
            .or_else(|| checker.check_urls.iter().find(|u| !u.trim().is_empty()).cloned())
            .unwrap_or_else(|| DEFAULT_TEST_URL.to_string());

        let mut config = CheckerConfig::new()
            .with_strict_check(checker.strict_check)
            .with_detailed_output(checker.strict_check && checker.detailed_output)
            .with_family_concurrency(
                ProxyType::Http,
                positive(checker.concurrent_http).unwrap_or(concurrent),
            )
            .with_family_concurrency(
                ProxyType::Socks5,
                positive(checker.concurrent_socks5).unwrap_or(concurrent),
            )
            .with_test_url(test_url)
            .with_user_agent(
                non_empty(&checker.user_agent).unwrap_or_else(|| self.scraper_user_agent()),
            )
            .with_geo_url(non_empty(&checker.geo_url).unwrap_or_else(|| DEFAULT_GEO_URL.to_string()))
            .with_headers_url(
                non_empty(&checker.headers_url).unwrap_or_else(|| DEFAULT_HEADERS_URL.to_string()),
            )
            .with_result_buffer(positive(checker.result_buffer).unwrap_or(DEFAULT_RESULT_BUFFER));

        if let Some(secs) = positive(checker.timeout) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = positive(checker.connect_timeout) {
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }

        config
    }
}
