//! Proxy Sweep - Proxy Harvester and Checker
//!
//! Scrapes public proxy lists, normalizes and deduplicates the candidates,
//! then verifies HTTP and SOCKS5 proxies concurrently by routing real traffic
//! through them.

pub mod config;
pub mod error;
pub mod lists;
pub mod logging;
pub mod pipeline;
pub mod proxy;
pub mod tui;

pub use config::Config;
pub use pipeline::{Paths, Pipeline};
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
