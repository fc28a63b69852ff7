//! Terminal rendering of scrape and check progress

mod progress;

pub use progress::{status_line, TerminalProgress};
