//! Sliding-window failure counting and temporary IP bans.
//!
//! Flow Overview:
//! 1) Every failed authentication appends the current instant to the source
//!    IP's failure list; entries older than `fail_window` are dropped.
//! 2) When the remaining count reaches `fail_limit`, the IP is banned for
//!    `ban_duration` and its failure list is cleared.
//! 3) The ban guard rejects banned IPs before any credential is inspected,
//!    so failures are never recorded while a ban is live.
//!
//! The window slides with the current instant, so failures spaced further
//! apart than `fail_window` never add up to a ban.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{
    sweeper::Sweeper,
    utils::{deadline_after, MAX_LIFETIME},
};

const DEFAULT_FAIL_LIMIT: u32 = 5;
const DEFAULT_FAIL_WINDOW: Duration = Duration::from_secs(60);
const DEFAULT_BAN_DURATION: Duration = Duration::from_secs(15 * 60);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug)]
pub struct BanConfig {
    fail_limit: u32,
    fail_window: Duration,
    ban_duration: Duration,
    sweep_interval: Duration,
}

impl Default for BanConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BanConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fail_limit: DEFAULT_FAIL_LIMIT,
            fail_window: DEFAULT_FAIL_WINDOW,
            ban_duration: DEFAULT_BAN_DURATION,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Failures inside the window that trigger a ban; zero is treated as one.
    #[must_use]
    pub fn with_fail_limit(mut self, limit: u32) -> Self {
        self.fail_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_fail_window(mut self, window: Duration) -> Self {
        self.fail_window = window.min(MAX_LIFETIME);
        self
    }

    /// How long a ban lasts, capped at `MAX_LIFETIME`.
    #[must_use]
    pub fn with_ban_duration(mut self, duration: Duration) -> Self {
        self.ban_duration = duration.min(MAX_LIFETIME);
        self
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.sweep_interval = interval;
        }
        self
    }

    #[must_use]
    pub fn fail_limit(&self) -> u32 {
        self.fail_limit
    }

    #[must_use]
    pub fn fail_window(&self) -> Duration {
        self.fail_window
    }

    #[must_use]
    pub fn ban_duration(&self) -> Duration {
        self.ban_duration
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }
}

#[derive(Debug, Default)]
struct BanState {
    failures: HashMap<String, VecDeque<Instant>>,
    bans: HashMap<String, Instant>,
}

fn prune(failures: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = failures.front() {
        if now.saturating_duration_since(*oldest) > window {
            failures.pop_front();
        } else {
            break;
        }
    }
}

impl BanState {
    fn purge(&mut self, now: Instant, window: Duration) -> (usize, usize) {
        let bans_before = self.bans.len();
        self.bans.retain(|_, until| now < *until);

        let failures_before = self.failures.len();
        self.failures.retain(|_, failures| {
            prune(failures, now, window);
            !failures.is_empty()
        });
        (
            bans_before - self.bans.len(),
            failures_before - self.failures.len(),
        )
    }
}

#[derive(Debug)]
pub struct BanTracker {
    config: BanConfig,
    state: Arc<Mutex<BanState>>,
    sweeper: Sweeper,
}

impl BanTracker {
    #[must_use]
    pub fn new(config: BanConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(BanState::default())),
            sweeper: Sweeper::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BanConfig {
        &self.config
    }

    /// Start the periodic sweep of elapsed bans and stale failure lists.
    pub fn spawn_sweeper(&self) {
        let state = Arc::clone(&self.state);
        let window = self.config.fail_window();
        self.sweeper
            .spawn("ban_tracker", self.config.sweep_interval(), move || {
                let (bans, failures) = state.lock().purge(Instant::now(), window);
                if bans > 0 || failures > 0 {
                    debug!(bans, failures, "purged expired bans");
                }
            });
    }

    /// Stop the periodic sweep. Safe to call repeatedly.
    pub fn stop(&self) {
        self.sweeper.stop();
    }

    /// Record a failed authentication from `ip`, banning it once the limit is
    /// reached inside the trailing window.
    pub fn record_failure(&self, ip: &str) {
        let now = Instant::now();
        let limit = usize::try_from(self.config.fail_limit()).unwrap_or(usize::MAX);
        let banned_until = deadline_after(now, self.config.ban_duration());

        let mut state = self.state.lock();
        let failures = state.failures.entry(ip.to_string()).or_default();
        failures.push_back(now);
        prune(failures, now, self.config.fail_window());
        let count = failures.len();

        if count >= limit {
            state.bans.insert(ip.to_string(), banned_until);
            state.failures.remove(ip);
            drop(state);
            warn!(
                ip,
                failures = count,
                ban_seconds = self.config.ban_duration().as_secs(),
                "banning source address after repeated authentication failures"
            );
        } else {
            debug!(ip, failures = count, "recorded authentication failure");
        }
    }

    /// Whether `ip` is currently banned; an elapsed ban is removed.
    pub fn is_banned(&self, ip: &str) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock();
        let Some(until) = state.bans.get(ip).copied() else {
            return false;
        };
        if now < until {
            return true;
        }
        state.bans.remove(ip);
        false
    }

    /// Failures currently counted for `ip` inside the window.
    #[must_use]
    pub fn failure_count(&self, ip: &str) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.failures.get_mut(ip).map_or(0, |failures| {
            prune(failures, now, self.config.fail_window());
            failures.len()
        })
    }

    /// Drop elapsed bans and failure lists with nothing left in the window.
    pub fn sweep(&self) -> usize {
        let (bans, failures) = self
            .state
            .lock()
            .purge(Instant::now(), self.config.fail_window());
        bans + failures
    }

    #[must_use]
    pub fn banned_count(&self) -> usize {
        self.state.lock().bans.len()
    }
}

impl Drop for BanTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    const IP: &str = "192.0.2.10";

    fn tracker(limit: u32, window_secs: u64, ban_secs: u64) -> BanTracker {
        BanTracker::new(
            BanConfig::new()
                .with_fail_limit(limit)
                .with_fail_window(Duration::from_secs(window_secs))
                .with_ban_duration(Duration::from_secs(ban_secs)),
        )
    }

    #[test]
    fn ban_config_defaults_and_overrides() {
        let config = BanConfig::new();
        assert_eq!(config.fail_limit(), 5);
        assert_eq!(config.fail_window(), Duration::from_secs(60));
        assert_eq!(config.ban_duration(), Duration::from_secs(900));

        let config = config.with_fail_limit(0);
        assert_eq!(config.fail_limit(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fifth_failure_inside_window_bans() {
        let tracker = tracker(5, 60, 300);
        for _ in 0..4 {
            tracker.record_failure(IP);
            advance(Duration::from_secs(2)).await;
        }
        assert!(!tracker.is_banned(IP));
        assert_eq!(tracker.failure_count(IP), 4);

        tracker.record_failure(IP);
        assert!(tracker.is_banned(IP));
        // History is cleared the moment the ban is imposed.
        assert_eq!(tracker.failure_count(IP), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_spread_past_window_never_accumulate() {
        let tracker = tracker(3, 60, 300);
        tracker.record_failure(IP);
        advance(Duration::from_millis(1)).await;
        tracker.record_failure(IP);

        advance(Duration::from_millis(60_000)).await;
        tracker.record_failure(IP);
        assert!(!tracker.is_banned(IP));
        // The t=0 failure fell out of the window; the other two remain.
        assert_eq!(tracker.failure_count(IP), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ban_lasts_exactly_ban_duration() {
        let tracker = tracker(1, 60, 300);
        tracker.record_failure(IP);
        assert!(tracker.is_banned(IP));

        advance(Duration::from_millis(299_999)).await;
        assert!(tracker.is_banned(IP));
        assert_eq!(tracker.banned_count(), 1);

        advance(Duration::from_millis(1)).await;
        assert!(!tracker.is_banned(IP));
        assert_eq!(tracker.banned_count(), 0);
        assert!(!tracker.is_banned(IP));
    }

    #[tokio::test]
    async fn huge_ban_duration_still_bans() {
        let config = BanConfig::new()
            .with_fail_limit(1)
            .with_fail_window(Duration::MAX)
            .with_ban_duration(Duration::from_secs(u64::MAX));
        assert_eq!(config.ban_duration(), MAX_LIFETIME);
        assert_eq!(config.fail_window(), MAX_LIFETIME);

        let tracker = BanTracker::new(config);
        tracker.record_failure("1.2.3.4");
        assert!(tracker.is_banned("1.2.3.4"));
        assert_eq!(tracker.failure_count("1.2.3.4"), 0);
        assert_eq!(tracker.sweep(), 0);
        assert!(tracker.is_banned("1.2.3.4"));
    }

    #[tokio::test(start_paused = true)]
    async fn bans_are_per_ip() {
        let tracker = tracker(2, 60, 300);
        tracker.record_failure(IP);
        tracker.record_failure("198.51.100.1");
        assert!(!tracker.is_banned(IP));
        tracker.record_failure(IP);
        assert!(tracker.is_banned(IP));
        assert!(!tracker.is_banned("198.51.100.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_elapsed_bans_and_stale_failures() {
        let tracker = tracker(2, 60, 120);
        tracker.record_failure(IP);
        tracker.record_failure(IP);
        tracker.record_failure("198.51.100.1");
        assert_eq!(tracker.sweep(), 0);

        advance(Duration::from_secs(121)).await;
        assert_eq!(tracker.sweep(), 2);
        assert_eq!(tracker.banned_count(), 0);
        assert_eq!(tracker.failure_count("198.51.100.1"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweep_runs_until_stopped() {
        let tracker = BanTracker::new(
            BanConfig::new()
                .with_fail_limit(1)
                .with_ban_duration(Duration::from_secs(10))
                .with_sweep_interval(Duration::from_secs(30)),
        );
        tracker.spawn_sweeper();
        tracker.record_failure(IP);
        assert_eq!(tracker.banned_count(), 1);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(tracker.banned_count(), 0);
        tracker.stop();
        tracker.stop();
    }
}
