//! Proxy module for harvesting and verifying proxies
//!
//! This module provides functionality for:
//! - Normalizing raw source lines into canonical `ip:port` addresses
//! - Fetching candidate lists from remote sources concurrently
//! - Deduplicating candidates in first-seen order
//! - Checking HTTP and SOCKS5 proxies in two independent bounded pools
//! - Reporting progress and persisting working proxies

pub mod checker;
pub mod crawler;
pub mod dedup;
pub mod geo;
pub mod models;
pub mod output;
pub mod parser;
pub mod progress;

pub use checker::{CheckHandle, CheckerConfig, ProxyChecker};
pub use crawler::{CrawlResult, CrawlerConfig, ProxyCrawler};
pub use dedup::remove_duplicates;
pub use geo::GeoLocation;
pub use models::{Proxy, ProxyCheckResult, ProxyCheckStatus, ProxyType};
pub use output::{FileOutput, MemoryOutput, OutputSink};
pub use parser::{ParseOptions, ProxyParser};
pub use progress::{CheckProgress, FamilyProgress, ProgressObserver, SilentProgress};
