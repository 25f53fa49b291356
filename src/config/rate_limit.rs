//! Rate limiting configuration.

use std::env;

/// Configuration for the per-partner sliding-window limiter
///
/// Quotas are per partner; only the window length is global.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { window_seconds: 60 }
    }
}

impl RateLimitConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let window_seconds = env::var("RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(60);

        Self { window_seconds }
    }
}
