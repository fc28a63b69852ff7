//! In-place terminal progress for scraping and checking

use crate::proxy::models::ProxyType;
use crate::proxy::progress::{
    progress_bar, CheckProgress, FamilyProgress, ProgressObserver, PROGRESS_BAR_WIDTH,
};
use crossterm::{
    cursor::{MoveToColumn, MoveUp},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use parking_lot::Mutex;
use std::io::{self, Write};
use tracing::debug;

/// One status line for a family, e.g. `HTTP [3/10] - Working: 1 [█████░░░] 30%`
pub fn status_line(proxy_type: ProxyType, family: &FamilyProgress) -> String {
    let percentage = family.percentage();
    format!(
        "{} [{}/{}] - Working: {} {} {:.0}%",
        proxy_type,
        family.checked,
        family.total,
        family.working,
        progress_bar(percentage, PROGRESS_BAR_WIDTH),
        percentage
    )
}

/// Renders progress on stdout, redrawing the status lines in place
#[derive(Debug, Default)]
pub struct TerminalProgress {
    /// Whether the two check status lines are on screen
    check_drawn: Mutex<bool>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn draw_scrape(&self, proxy_type: ProxyType, found: usize, completed: usize, total: usize, done: bool) -> io::Result<()> {
        let mut out = io::stdout().lock();
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(format!(
                "✓ Scraped {} {} proxies [{}/{}]",
                found, proxy_type, completed, total
            ))
        )?;
        if done {
            queue!(out, Print("\n"))?;
        }
        out.flush()
    }

    fn draw_check(&self, progress: &CheckProgress) -> io::Result<()> {
        let mut drawn = self.check_drawn.lock();
        let mut out = io::stdout().lock();

        if *drawn {
            queue!(out, MoveUp(1))?;
        } else {
            queue!(out, Print("🔍 Checking proxies...\n"))?;
        }

        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(status_line(ProxyType::Http, &progress.http)),
            Print("\n"),
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(status_line(ProxyType::Socks5, &progress.socks5)),
        )?;
        *drawn = true;
        out.flush()
    }

    fn draw_summary(&self, progress: &CheckProgress) -> io::Result<()> {
        self.draw_check(progress)?;

        let mut out = io::stdout().lock();
        queue!(
            out,
            Print(format!(
                "\n✓ Found {} working HTTP proxies\n",
                progress.http.working
            )),
            Print(format!(
                "✓ Found {} working SOCKS5 proxies\n",
                progress.socks5.working
            )),
        )?;
        out.flush()
    }
}

impl ProgressObserver for TerminalProgress {
    fn scrape_progress(&self, proxy_type: ProxyType, found: usize, completed: usize, total: usize) {
        if let Err(e) = self.draw_scrape(proxy_type, found, completed, total, false) {
            debug!("progress render failed: {}", e);
        }
    }

    fn scrape_finished(&self, proxy_type: ProxyType, found: usize, completed: usize, total: usize) {
        if let Err(e) = self.draw_scrape(proxy_type, found, completed, total, true) {
            debug!("progress render failed: {}", e);
        }
    }

    fn candidates_ready(&self, proxy_type: ProxyType, carried_over: usize, total: usize) {
        if carried_over > 0 {
            println!("ℹ️ Found {} existing {} proxies", carried_over, proxy_type);
        }
        println!("✅ Total {} {} proxies to check", total, proxy_type);
    }

    fn check_progress(&self, progress: &CheckProgress) {
        if let Err(e) = self.draw_check(progress) {
            debug!("progress render failed: {}", e);
        }
    }

    fn check_finished(&self, progress: &CheckProgress) {
        if let Err(e) = self.draw_summary(progress) {
            debug!("progress render failed: {}", e);
        }
    }
}
