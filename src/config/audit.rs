//! Audit log configuration.

use std::env;

/// Configuration for the in-memory audit trail
#[derive(Clone, Debug)]
pub struct AuditConfig {
    /// Maximum retained entries; the oldest are evicted first
    pub capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}

impl AuditConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let capacity = env::var("AUDIT_LOG_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(10_000);

        Self { capacity }
    }
}
