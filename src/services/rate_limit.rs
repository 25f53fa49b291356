//! Per-partner sliding-window rate limiting.

use crate::config::RateLimitConfig;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Instant,
};

/// Admission times of one partner, in seconds since the limiter's origin,
/// oldest first
#[derive(Debug, Default)]
struct RateWindow {
    timestamps: VecDeque<f64>,
}

impl RateWindow {
    /// A reading older than the newest admission is treated as that admission,
    /// keeping the deque ordered
    fn clamp(&self, now: f64) -> f64 {
        self.timestamps.back().map_or(now, |last| now.max(*last))
    }

    /// Drop every timestamp that is at least `window` seconds old
    fn prune(&mut self, now: f64, window: f64) {
        let cutoff = now - window;
        while self.timestamps.front().is_some_and(|ts| *ts <= cutoff) {
            self.timestamps.pop_front();
        }
    }

    fn admit(&mut self, quota: usize, now: f64, window: f64) -> bool {
        let now = self.clamp(now);
        self.prune(now, window);
        if self.timestamps.len() >= quota {
            return false;
        }
        self.timestamps.push_back(now);
        true
    }

    fn remaining(&mut self, quota: usize, now: f64, window: f64) -> usize {
        let now = self.clamp(now);
        self.prune(now, window);
        quota.saturating_sub(self.timestamps.len())
    }

    /// Rounded up, so a non-empty window never reports zero
    fn reset_seconds(&mut self, now: f64, window: f64) -> u64 {
        let now = self.clamp(now);
        self.prune(now, window);
        match self.timestamps.front() {
            Some(oldest) => (oldest + window - now).max(0.0).ceil() as u64,
            None => 0,
        }
    }
}

/// Sliding-window limiter keyed by partner id
///
/// Each partner owns its own window behind its own lock, so the
/// check-then-record step is atomic per partner while different partners
/// never contend beyond the brief map lookup. The clock is monotonic and is
/// read while the partner's lock is held. Windows are created lazily and
/// never removed; their number is bounded by the number of partners.
#[derive(Clone)]
pub struct SlidingWindowLimiter {
    window_seconds: f64,
    origin: Instant,
    windows: Arc<Mutex<HashMap<String, Arc<Mutex<RateWindow>>>>>,
}

impl SlidingWindowLimiter {
    /// Create a new limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            window_seconds: config.window_seconds as f64,
            origin: Instant::now(),
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn window_seconds(&self) -> u64 {
        self.window_seconds as u64
    }

    fn window(&self, partner_id: &str) -> Arc<Mutex<RateWindow>> {
        let mut windows = self.windows.lock();
        windows
            .entry(partner_id.to_string())
            .or_default()
            .clone()
    }

    fn elapsed(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    /// Admit or reject a request from `partner_id` at the current time
    ///
    /// Returns `true` and records the request if fewer than `quota` requests
    /// were admitted in the trailing window; rejected requests are not
    /// recorded.
    pub fn allowed(&self, partner_id: &str, quota: usize) -> bool {
        let window = self.window(partner_id);
        let mut state = window.lock();
        state.admit(quota, self.elapsed(), self.window_seconds)
    }

    /// Requests still admissible in the current window
    pub fn remaining(&self, partner_id: &str, quota: usize) -> usize {
        let window = self.window(partner_id);
        let mut state = window.lock();
        state.remaining(quota, self.elapsed(), self.window_seconds)
    }

    /// Whole seconds until the oldest counted request leaves the window
    pub fn reset_seconds(&self, partner_id: &str) -> u64 {
        let window = self.window(partner_id);
        let mut state = window.lock();
        state.reset_seconds(self.elapsed(), self.window_seconds)
    }

    /// [`allowed`](Self::allowed) against an explicit clock reading, in
    /// seconds
    pub fn allowed_at(&self, partner_id: &str, quota: usize, now: f64) -> bool {
        self.window(partner_id)
            .lock()
            .admit(quota, now, self.window_seconds)
    }

    pub fn remaining_at(&self, partner_id: &str, quota: usize, now: f64) -> usize {
        self.window(partner_id)
            .lock()
            .remaining(quota, now, self.window_seconds)
    }

    pub fn reset_seconds_at(&self, partner_id: &str, now: f64) -> u64 {
        self.window(partner_id)
            .lock()
            .reset_seconds(now, self.window_seconds)
    }
}
