//! Proxy checker module for verifying candidates by routing real traffic
//! through them
//!
//! Each family (HTTP, SOCKS5) gets its own bounded pool. A candidate holds a
//! pool slot only while it is being dialed and probed. Every finished check
//! updates the shared counters, appends working proxies to the output sink and
//! is published once on the result stream.

use crate::error::{CheckError, CheckResult};
use crate::proxy::geo::{HeadersEcho, IpLookup};
use crate::proxy::models::{Proxy, ProxyCheckResult, ProxyType, DETAILED_HEADER};
use crate::proxy::output::{MemoryOutput, OutputSink};
use crate::proxy::progress::{
    CheckProgress, CheckState, ProgressObserver, SilentProgress, PROGRESS_INTERVAL,
};
use crate::Result;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Proxy as ReqwestProxy, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Default response timeout for proxy checks in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default connect timeout for proxy checks in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Response and connect timeout used in strict mode unless overridden
pub const STRICT_TIMEOUT_SECS: u64 = 3;

/// Default number of concurrent checks per family
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Default URL to test proxies against
pub const DEFAULT_TEST_URL: &str = "http://checkip.amazonaws.com";

/// Geolocation endpoint queried through the proxy in strict mode
pub const DEFAULT_GEO_URL: &str = "http://ip-api.com/json";

/// Header echo endpoint queried through the proxy in strict mode
pub const DEFAULT_HEADERS_URL: &str = "https://httpbin.org/headers";

/// Default capacity of the result stream
pub const DEFAULT_RESULT_BUFFER: usize = 100;

/// Strict mode rejects proxies whose two probes together take this long or longer
pub const STRICT_MAX_LATENCY: Duration = Duration::from_secs(2);

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Response timeout; `None` selects the mode default
    pub timeout: Option<Duration>,
    /// Connect timeout; `None` selects the mode default
    pub connect_timeout: Option<Duration>,
    /// Pool size for HTTP candidates
    pub concurrency_http: usize,
    /// Pool size for SOCKS5 candidates
    pub concurrency_socks5: usize,
    /// URL to test proxies against in basic mode
    pub test_url: String,
    /// User agent sent with every probe
    pub user_agent: String,
    /// Geolocation and anonymity probing with a latency threshold
    pub strict_check: bool,
    /// Pipe-delimited output records, only honoured in strict mode
    pub detailed_output: bool,
    pub geo_url: String,
    pub headers_url: String,
    /// Capacity of the result stream
    pub result_buffer: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
            concurrency_http: DEFAULT_CONCURRENCY,
            concurrency_socks5: DEFAULT_CONCURRENCY,
            test_url: DEFAULT_TEST_URL.to_string(),
            user_agent: crate::proxy::crawler::DEFAULT_USER_AGENT.to_string(),
            strict_check: false,
            detailed_output: false,
            geo_url: DEFAULT_GEO_URL.to_string(),
            headers_url: DEFAULT_HEADERS_URL.to_string(),
            result_buffer: DEFAULT_RESULT_BUFFER,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the pool size of both families
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency_http = concurrency;
        self.concurrency_socks5 = concurrency;
        self
    }

    pub fn with_family_concurrency(mut self, proxy_type: ProxyType, concurrency: usize) -> Self {
        match proxy_type {
            ProxyType::Http => self.concurrency_http = concurrency,
            ProxyType::Socks5 => self.concurrency_socks5 = concurrency,
        }
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_strict_check(mut self, strict: bool) -> Self {
        self.strict_check = strict;
        self
    }

    pub fn with_detailed_output(mut self, detailed: bool) -> Self {
        self.detailed_output = detailed;
        self
    }

    pub fn with_geo_url(mut self, url: String) -> Self {
        self.geo_url = url;
        self
    }

    pub fn with_headers_url(mut self, url: String) -> Self {
        self.headers_url = url;
        self
    }

    pub fn with_result_buffer(mut self, capacity: usize) -> Self {
        self.result_buffer = capacity;
        self
    }

    /// Overall time allowed to receive a complete response
    pub fn request_timeout(&self) -> Duration {
        self.timeout.unwrap_or_else(|| {
            Duration::from_secs(if self.strict_check {
                STRICT_TIMEOUT_SECS
            } else {
                DEFAULT_TIMEOUT_SECS
            })
        })
    }

    /// Time allowed to establish the connection to the proxy
    pub fn dial_timeout(&self) -> Duration {
        self.connect_timeout.unwrap_or_else(|| {
            Duration::from_secs(if self.strict_check {
                STRICT_TIMEOUT_SECS
            } else {
                DEFAULT_CONNECT_TIMEOUT_SECS
            })
        })
    }

    /// Detailed records are only written in strict mode
    pub fn is_detailed(&self) -> bool {
        self.strict_check && self.detailed_output
    }

    pub fn concurrency(&self, proxy_type: ProxyType) -> usize {
        match proxy_type {
            ProxyType::Http => self.concurrency_http,
            ProxyType::Socks5 => self.concurrency_socks5,
        }
    }
}

/// A running check session
///
/// The result stream closes once, after the last check has published its
/// result. Results not taken from the stream are discarded by [`finish`].
///
/// [`finish`]: CheckHandle::finish
pub struct CheckHandle {
    results: mpsc::Receiver<ProxyCheckResult>,
    state: CheckState,
    task: JoinHandle<CheckProgress>,
}

impl CheckHandle {
    /// Stream of every finished check, working or not
    pub fn results(&mut self) -> &mut mpsc::Receiver<ProxyCheckResult> {
        &mut self.results
    }

    /// Current counters
    pub fn progress(&self) -> CheckProgress {
        self.state.snapshot()
    }

    /// Wait for every check to finish, draining unread results
    pub async fn finish(self) -> Result<CheckProgress> {
        let Self {
            mut results, task, ..
        } = self;

        let drain = async move { while results.recv().await.is_some() {} };
        let (summary, ()) = tokio::join!(task, drain);
        Ok(summary?)
    }
}

/// Proxy checker for validating proxies
#[derive(Clone)]
pub struct ProxyChecker {
    config: Arc<CheckerConfig>,
    output: Arc<dyn OutputSink>,
    observer: Arc<dyn ProgressObserver>,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self {
            config: Arc::new(config),
            output: Arc::new(MemoryOutput::new()),
            observer: Arc::new(SilentProgress),
        }
    }

    /// Write working proxies to `output`
    pub fn with_output(mut self, output: Arc<dyn OutputSink>) -> Self {
        self.output = output;
        self
    }

    /// Report checking progress to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check a single proxy under the configured validation tier
    pub async fn check_proxy(&self, proxy: &Proxy) -> ProxyCheckResult {
        let client = match self.create_client(proxy) {
            Ok(client) => client,
            Err(e) => {
                warn!("Error creating {} client for {}: {}", proxy.proxy_type, proxy, e);
                return ProxyCheckResult::failed(proxy.clone(), e.to_string());
            }
        };

        let result = if self.config.strict_check {
            self.strict_check(proxy, &client).await
        } else {
            self.basic_check(proxy, &client).await
        };

        debug!("{} {} -> {:?}", proxy.proxy_type, proxy, result.status);
        result
    }

    /// Check both families, returning the final counters
    pub async fn check_proxies(&self, http: Vec<String>, socks5: Vec<String>) -> Result<CheckProgress> {
        self.spawn_check(http, socks5).finish().await
    }

    /// Start checking both families in the background
    pub fn spawn_check(&self, http: Vec<String>, socks5: Vec<String>) -> CheckHandle {
        let (tx, rx) = mpsc::channel(self.config.result_buffer.max(1));
        let state = CheckState::new(http.len(), socks5.len());

        let checker = self.clone();
        let run_state = state.clone();
        let task = tokio::spawn(async move { checker.run(http, socks5, run_state, tx).await });

        CheckHandle {
            results: rx,
            state,
            task,
        }
    }

    /// Line persisted for a working proxy
    pub fn format_output(&self, result: &ProxyCheckResult) -> String {
        if self.config.is_detailed() {
            result.to_detailed_line()
        } else {
            result.proxy.address.clone()
        }
    }

    async fn run(
        self,
        http: Vec<String>,
        socks5: Vec<String>,
        state: CheckState,
        tx: mpsc::Sender<ProxyCheckResult>,
    ) -> CheckProgress {
        info!(
            "Checking {} HTTP and {} SOCKS5 proxies (strict: {})",
            http.len(),
            socks5.len(),
            self.config.strict_check
        );

        if self.config.is_detailed() {
            for proxy_type in ProxyType::ALL {
                if let Err(e) = self.output.write_header(proxy_type, DETAILED_HEADER) {
                    warn!("Error writing {} header: {:#}", proxy_type, e);
                }
            }
        }

        let reporter = self.spawn_reporter(state.clone());

        tokio::join!(
            self.check_family(ProxyType::Http, http, &state, &tx),
            self.check_family(ProxyType::Socks5, socks5, &state, &tx),
        );
        // every task's sender is gone; dropping ours closes the stream
        drop(tx);

        if let Err(e) = reporter.await {
            warn!("Progress reporter failed: {}", e);
        }

        let progress = state.snapshot();
        info!(
            "Found {} working HTTP and {} working SOCKS5 proxies",
            progress.http.working, progress.socks5.working
        );
        progress
    }

    async fn check_family(
        &self,
        proxy_type: ProxyType,
        addresses: Vec<String>,
        state: &CheckState,
        tx: &mpsc::Sender<ProxyCheckResult>,
    ) {
        let permits = self
            .config
            .concurrency(proxy_type)
            .clamp(1, Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut tasks = JoinSet::new();

        for address in addresses {
            let checker = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let state = state.clone();
            let tx = tx.clone();

            tasks.spawn(async move {
                let proxy = Proxy::new(address, proxy_type);
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => checker.check_proxy(&proxy).await,
                    Err(e) => ProxyCheckResult::failed(proxy, e.to_string()),
                };
                checker.complete(result, &state, &tx).await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                // keep the counters consistent so progress reporting terminates
                warn!("{} check task failed: {}", proxy_type, e);
                state.record(proxy_type, false);
            }
        }
    }

    async fn complete(
        &self,
        result: ProxyCheckResult,
        state: &CheckState,
        tx: &mpsc::Sender<ProxyCheckResult>,
    ) {
        let proxy_type = result.proxy.proxy_type;
        let working = result.is_working();

        if working {
            let line = self.format_output(&result);
            if let Err(e) = self.output.append(proxy_type, &line) {
                warn!("Error saving {} proxy {}: {:#}", proxy_type, result.proxy, e);
            }
        }

        state.record(proxy_type, working);

        // nobody listening is fine
        let _ = tx.send(result).await;
    }

    fn spawn_reporter(&self, state: CheckState) -> JoinHandle<()> {
        let observer = Arc::clone(&self.observer);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
            loop {
                ticker.tick().await;
                let progress = state.snapshot();
                if progress.is_complete() {
                    observer.check_finished(&progress);
                    break;
                }
                observer.check_progress(&progress);
            }
        })
    }

    async fn basic_check(&self, proxy: &Proxy, client: &Client) -> ProxyCheckResult {
        let start = Instant::now();
        match self.probe_status(client).await {
            Ok(()) => ProxyCheckResult::working(proxy.clone(), start.elapsed()),
            Err(e) => Self::rejected(proxy, e),
        }
    }

    async fn probe_status(&self, client: &Client) -> CheckResult<()> {
        let response = client
            .get(&self.config.test_url)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(CheckError::Status(status)),
        }
    }

    async fn strict_check(&self, proxy: &Proxy, client: &Client) -> ProxyCheckResult {
        let start = Instant::now();
        let (lookup, anonymous) = match self.strict_probes(client).await {
            Ok(report) => report,
            Err(e) => return Self::rejected(proxy, e),
        };
        let elapsed = start.elapsed();

        let result = if lookup.query.is_empty() {
            Self::rejected(proxy, CheckError::MissingEgressIp)
        } else if elapsed >= STRICT_MAX_LATENCY {
            Self::rejected(proxy, CheckError::TooSlow(elapsed))
        } else {
            ProxyCheckResult::working(proxy.clone(), elapsed)
        };

        let location = lookup.location();
        result.with_strict_report(lookup.query, location, anonymous, elapsed)
    }

    /// Geolocation lookup followed by the header echo, both through the proxy
    async fn strict_probes(&self, client: &Client) -> CheckResult<(IpLookup, bool)> {
        let body = self.fetch_text(client, &self.config.geo_url).await?;
        let lookup: IpLookup = serde_json::from_str(&body)?;
        if !lookup.is_success() {
            return Err(CheckError::LookupFailed(lookup.status));
        }

        let body = self.fetch_text(client, &self.config.headers_url).await?;
        let echo: HeadersEcho = serde_json::from_str(&body)?;
        let anonymous = !echo.reveals(&lookup.query);

        Ok((lookup, anonymous))
    }

    async fn fetch_text(&self, client: &Client, url: &str) -> CheckResult<String> {
        let response = client
            .get(url)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?;
        Ok(response.text().await?)
    }

    fn rejected(proxy: &Proxy, error: CheckError) -> ProxyCheckResult {
        if error.is_timeout() {
            ProxyCheckResult::timeout(proxy.clone())
        } else {
            ProxyCheckResult::failed(proxy.clone(), error.to_string())
        }
    }

    /// Create a reqwest client that routes everything through the proxy
    fn create_client(&self, proxy: &Proxy) -> CheckResult<Client> {
        let reqwest_proxy = ReqwestProxy::all(proxy.url()).map_err(CheckError::Client)?;

        Client::builder()
            .proxy(reqwest_proxy)
            .connect_timeout(self.config.dial_timeout())
            .timeout(self.config.request_timeout())
            .build()
            .map_err(CheckError::Client)
    }
}

impl Default for ProxyChecker {
    fn default() -> Self {
        Self::new()
    }
}
