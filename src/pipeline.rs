//! End-to-end run: scrape both families, merge the previous results, dedupe,
//! then check everything and write the working proxies back out.

use crate::config::Config;
use crate::lists::read_lines;
use crate::proxy::dedup::remove_duplicates;
use crate::proxy::models::ProxyType;
use crate::proxy::output::FileOutput;
use crate::proxy::parser::{ParseOptions, ProxyParser};
use crate::proxy::progress::{CheckProgress, ProgressObserver, SilentProgress};
use crate::proxy::{ProxyChecker, ProxyCrawler};
use crate::Result;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Where source lists are read from and results are written to
#[derive(Debug, Clone)]
pub struct Paths {
    /// Holds `http.txt` and `socks5.txt` with one source URL per line
    pub sources_dir: PathBuf,
    /// Holds `http.txt` and `socks5.txt` with the working proxies
    pub output_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            sources_dir: PathBuf::from("sources"),
            output_dir: PathBuf::from("out"),
        }
    }
}

/// Address part of a previously written output line.
///
/// Detailed records keep the address in their first field; the header row and
/// anything else that is not an address is dropped.
fn previous_candidate(line: &str, options: ParseOptions) -> Option<String> {
    let address = line.split('|').next()?.trim();
    ProxyParser::is_valid(address, options).then(|| address.to_string())
}

/// One full scrape-and-check run
pub struct Pipeline {
    config: Config,
    paths: Paths,
    observer: Arc<dyn ProgressObserver>,
}

impl Pipeline {
    pub fn new(config: Config, paths: Paths) -> Self {
        Self {
            config,
            paths,
            observer: Arc::new(SilentProgress),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run to completion and return the final counters.
    ///
    /// Only unreadable source lists and an unusable output directory abort the
    /// run; both are detected before any network activity.
    pub async fn run(&self) -> Result<CheckProgress> {
        let http_sources = self.read_sources(ProxyType::Http)?;
        let socks5_sources = self.read_sources(ProxyType::Socks5)?;
        let output = FileOutput::open(&self.paths.output_dir)?;

        let crawler = ProxyCrawler::with_config(self.config.crawler_config())?
            .with_observer(Arc::clone(&self.observer));
        let http = crawler.crawl_sources(&http_sources, ProxyType::Http).await;
        let socks5 = crawler.crawl_sources(&socks5_sources, ProxyType::Socks5).await;

        let http = self.merge_previous(&output, ProxyType::Http, http);
        let socks5 = self.merge_previous(&output, ProxyType::Socks5, socks5);

        output.truncate()?;

        let checker = ProxyChecker::with_config(self.config.checker_config())
            .with_output(Arc::new(output))
            .with_observer(Arc::clone(&self.observer));

        checker.check_proxies(http, socks5).await
    }

    fn read_sources(&self, proxy_type: ProxyType) -> Result<Vec<String>> {
        let path = self.paths.sources_dir.join(proxy_type.list_file_name());
        read_lines(&path).with_context(|| format!("cannot read {} sources", proxy_type))
    }

    /// Append last run's working proxies so they are checked again, then dedupe
    fn merge_previous(
        &self,
        output: &FileOutput,
        proxy_type: ProxyType,
        mut scraped: Vec<String>,
    ) -> Vec<String> {
        let options = self.config.crawler_config().parse_options;
        let previous: Vec<String> = read_lines(output.path(proxy_type))
            .unwrap_or_default()
            .iter()
            .filter_map(|line| previous_candidate(line, options))
            .collect();
        let existing = previous.len();

        scraped.extend(previous);
        let candidates = remove_duplicates(scraped);

        info!(
            "{} candidates: {} unique ({} carried over)",
            proxy_type,
            candidates.len(),
            existing
        );
        self.observer
            .candidates_ready(proxy_type, existing, candidates.len());

        candidates
    }
}
