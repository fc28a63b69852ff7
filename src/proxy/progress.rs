//! Progress counters shared by the checking pools and the observer seam that
//! reports them.

use crate::proxy::models::ProxyType;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// How often progress is sampled while scraping or checking
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Width of the rendered progress bar, in cells
pub const PROGRESS_BAR_WIDTH: usize = 30;

/// Counters for one proxy family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FamilyProgress {
    pub total: usize,
    pub checked: usize,
    pub working: usize,
}

impl FamilyProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.checked >= self.total
    }

    /// Percentage checked; an empty family counts as fully checked
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.checked as f64 / self.total as f64 * 100.0
    }
}

/// Snapshot of both families' counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckProgress {
    pub http: FamilyProgress,
    pub socks5: FamilyProgress,
}

impl CheckProgress {
    pub fn new(total_http: usize, total_socks5: usize) -> Self {
        Self {
            http: FamilyProgress::new(total_http),
            socks5: FamilyProgress::new(total_socks5),
        }
    }

    pub fn family(&self, proxy_type: ProxyType) -> &FamilyProgress {
        match proxy_type {
            ProxyType::Http => &self.http,
            ProxyType::Socks5 => &self.socks5,
        }
    }

    fn family_mut(&mut self, proxy_type: ProxyType) -> &mut FamilyProgress {
        match proxy_type {
            ProxyType::Http => &mut self.http,
            ProxyType::Socks5 => &mut self.socks5,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.http.is_complete() && self.socks5.is_complete()
    }
}

/// Counter state for one checking session, shared by both family pools
#[derive(Debug, Clone, Default)]
pub struct CheckState {
    inner: Arc<Mutex<CheckProgress>>,
}

impl CheckState {
    pub fn new(total_http: usize, total_socks5: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CheckProgress::new(total_http, total_socks5))),
        }
    }

    /// Count one finished check
    pub fn record(&self, proxy_type: ProxyType, working: bool) {
        let mut progress = self.inner.lock();
        let family = progress.family_mut(proxy_type);
        family.checked += 1;
        if working {
            family.working += 1;
        }
    }

    pub fn snapshot(&self) -> CheckProgress {
        *self.inner.lock()
    }
}

/// Receives progress updates from scraping and checking.
///
/// All methods default to doing nothing, so observers only implement what they
/// render.
pub trait ProgressObserver: Send + Sync {
    /// Sources fetched so far for one family
    fn scrape_progress(&self, _proxy_type: ProxyType, _found: usize, _completed: usize, _total: usize) {}

    /// All sources of one family have been fetched
    fn scrape_finished(&self, _proxy_type: ProxyType, _found: usize, _completed: usize, _total: usize) {}

    /// Candidates for one family after merging the previous run and deduplicating
    fn candidates_ready(&self, _proxy_type: ProxyType, _carried_over: usize, _total: usize) {}

    /// Periodic snapshot while checks are running
    fn check_progress(&self, _progress: &CheckProgress) {}

    /// Final snapshot once every candidate has been checked
    fn check_finished(&self, _progress: &CheckProgress) {}
}

/// Observer that discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {}

/// Render `[████░░░░]` with `floor(percentage / 100 * width)` filled cells
pub fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage / 100.0 * width as f64).floor().max(0.0) as usize).min(width);

    let mut bar = String::with_capacity(width * 3 + 2);
    bar.push('[');
    bar.extend(std::iter::repeat('█').take(filled));
    bar.extend(std::iter::repeat('░').take(width - filled));
    bar.push(']');
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "[░░░░]");
        assert_eq!(progress_bar(50.0, 4), "[██░░]");
        assert_eq!(progress_bar(74.9, 4), "[██░░]");
        assert_eq!(progress_bar(100.0, 4), "[████]");
        assert_eq!(progress_bar(250.0, 4), "[████]");
        assert_eq!(progress_bar(f64::NAN, 4), "[░░░░]");
    }

    #[test]
    fn test_family_progress_percentage() {
        let mut family = FamilyProgress::new(4);
        assert_eq!(family.percentage(), 0.0);
        family.checked = 1;
        assert_eq!(family.percentage(), 25.0);
        assert!(!family.is_complete());

        assert_eq!(FamilyProgress::new(0).percentage(), 100.0);
        assert!(FamilyProgress::new(0).is_complete());
    }

    #[test]
    fn test_check_state_record() {
        let state = CheckState::new(2, 1);
        state.record(ProxyType::Http, true);
        state.record(ProxyType::Http, false);
        assert!(!state.snapshot().is_complete());

        state.record(ProxyType::Socks5, false);
        let snapshot = state.snapshot();
        assert!(snapshot.is_complete());
        assert_eq!(snapshot.http, FamilyProgress { total: 2, checked: 2, working: 1 });
        assert_eq!(snapshot.family(ProxyType::Socks5).working, 0);
    }

    #[test]
    fn test_check_state_shared_across_clones() {
        let state = CheckState::new(3, 0);
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || state.record(ProxyType::Http, true))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(state.snapshot().http.working, 3);
    }
}
