//! Proxy crawler module for fetching candidate lists from remote sources
//!
//! Each source URL is fetched once with a rotating user agent. Bodies are split
//! into lines and every line goes through the [`ProxyParser`]. A failing source
//! is logged and contributes nothing; it never aborts the crawl.

use crate::proxy::models::ProxyType;
use crate::proxy::parser::{ParseOptions, ProxyParser};
use crate::proxy::progress::{ProgressObserver, SilentProgress, PROGRESS_INTERVAL};
use crate::Result;
use parking_lot::Mutex;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of sources fetched at once
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default user agent for HTTP requests
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Result of crawling a single source
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// The source that was crawled
    pub source: String,
    /// Candidates extracted from the source
    pub proxies: Vec<String>,
    /// Error message if crawling failed
    pub error: Option<String>,
}

impl CrawlResult {
    /// Create a successful crawl result
    pub fn success(source: String, proxies: Vec<String>) -> Self {
        Self {
            source,
            proxies,
            error: None,
        }
    }

    /// Create a failed crawl result
    pub fn failure(source: String, error: String) -> Self {
        Self {
            source,
            proxies: Vec::new(),
            error: Some(error),
        }
    }

    /// Check if the crawl was successful
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Configuration for proxy crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Timeout for HTTP requests
    pub timeout: Duration,
    /// User agents, rotated by source index
    pub user_agents: Vec<String>,
    /// Maximum number of sources fetched at once
    pub concurrency: usize,
    /// How forgiving line parsing is
    pub parse_options: ParseOptions,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agents: vec![DEFAULT_USER_AGENT.to_string()],
            concurrency: DEFAULT_CONCURRENCY,
            parse_options: ParseOptions::default(),
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agents(mut self, user_agents: Vec<String>) -> Self {
        self.user_agents = user_agents;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_parse_options(mut self, parse_options: ParseOptions) -> Self {
        self.parse_options = parse_options;
        self
    }

    /// User agent for the source at `index`
    pub fn user_agent_for(&self, index: usize) -> &str {
        if self.user_agents.is_empty() {
            return DEFAULT_USER_AGENT;
        }
        &self.user_agents[index % self.user_agents.len()]
    }
}

#[derive(Debug, Default)]
struct CrawlProgress {
    proxies: Vec<String>,
    completed: usize,
}

/// Proxy crawler for fetching candidates from source URLs
#[derive(Clone)]
pub struct ProxyCrawler {
    config: Arc<CrawlerConfig>,
    client: Client,
    observer: Arc<dyn ProgressObserver>,
}

impl ProxyCrawler {
    /// Create a new proxy crawler with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(CrawlerConfig::default())
    }

    /// Create a new proxy crawler with custom configuration
    pub fn with_config(config: CrawlerConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).no_proxy().build()?;

        Ok(Self {
            config: Arc::new(config),
            client,
            observer: Arc::new(SilentProgress),
        })
    }

    /// Report scraping progress to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Fetch and parse candidates from a single URL
    pub async fn crawl_url(&self, url: &str, user_agent: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await?;
        let content = response.text().await?;
        Ok(ProxyParser::parse_string(&content, self.config.parse_options))
    }

    /// Fetch all sources of one family and concatenate their candidates.
    ///
    /// Returns only after every source has finished. Candidates keep their
    /// in-source order; sources are concatenated in completion order.
    pub async fn crawl_sources(&self, urls: &[String], proxy_type: ProxyType) -> Vec<String> {
        let total = urls.len();
        info!("Starting {} proxy scraping from {} sources", proxy_type, total);

        let state = Arc::new(Mutex::new(CrawlProgress::default()));
        let semaphore = Arc::new(Semaphore::new(
            self.config.concurrency.clamp(1, Semaphore::MAX_PERMITS),
        ));
        let mut tasks = JoinSet::new();

        for (index, url) in urls.iter().enumerate() {
            let crawler = self.clone();
            let state = Arc::clone(&state);
            let semaphore = Arc::clone(&semaphore);
            let url = url.clone();

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        let user_agent = crawler.config.user_agent_for(index);
                        let fetched = crawler.crawl_url(&url, user_agent).await;
                        match fetched {
                            Ok(proxies) => CrawlResult::success(url, proxies),
                            Err(e) => CrawlResult::failure(url, e.to_string()),
                        }
                    }
                    Err(e) => CrawlResult::failure(url, e.to_string()),
                };

                if result.is_success() {
                    debug!("Found {} proxies at {}", result.proxies.len(), result.source);
                } else {
                    warn!(
                        "Error fetching {}: {}",
                        result.source,
                        result.error.as_deref().unwrap_or_default()
                    );
                }

                let mut state = state.lock();
                state.proxies.extend(result.proxies);
                state.completed += 1;
            });
        }

        let reporter = {
            let state = Arc::clone(&state);
            let observer = Arc::clone(&self.observer);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
                loop {
                    ticker.tick().await;
                    let (found, completed) = {
                        let state = state.lock();
                        (state.proxies.len(), state.completed)
                    };
                    if completed == total {
                        break;
                    }
                    observer.scrape_progress(proxy_type, found, completed, total);
                }
            })
        };

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                // the task panicked or was cancelled; count it so progress completes
                warn!("{} source task failed: {}", proxy_type, e);
                state.lock().completed += 1;
            }
        }
        if let Err(e) = reporter.await {
            warn!("{} scrape reporter failed: {}", proxy_type, e);
        }

        let proxies = std::mem::take(&mut state.lock().proxies);
        info!("Scraped {} {} proxies from {} sources", proxies.len(), proxy_type, total);
        self.observer
            .scrape_finished(proxy_type, proxies.len(), total, total);

        proxies
    }
}
