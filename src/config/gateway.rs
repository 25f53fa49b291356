//! Gateway configuration: backend target, forwarding timeout, key header and
//! administrative settings.

use std::{env, time::Duration};

pub const DEFAULT_BACKEND_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 30_000;

/// Top-level gateway configuration
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Base URL of the backend; `/api/<path>` is forwarded to `<backend_url>/<path>`
    pub backend_url: String,
    /// Deadline for a single backend call
    pub backend_timeout_ms: u64,
    /// Inbound header carrying the partner key
    pub api_key_header: String,
    pub bind_address: String,
    /// Shared secret for administrative mutations; disabled when `None`
    pub admin_key: Option<String>,
    /// Seed the registry with the demo partners
    pub demo_partners: bool,
    pub metrics_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            backend_timeout_ms: DEFAULT_BACKEND_TIMEOUT_MS,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            admin_key: None,
            demo_partners: true,
            metrics_enabled: true,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let backend_url = env::var("GATEWAY_BACKEND_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let backend_timeout_ms = env::var("GATEWAY_BACKEND_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_BACKEND_TIMEOUT_MS);

        let api_key_header = env::var("GATEWAY_API_KEY_HEADER")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string());

        let bind_address = env::var("GATEWAY_BIND_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());

        let admin_key = env::var("GATEWAY_ADMIN_KEY")
            .ok()
            .filter(|v| !v.is_empty());

        let demo_partners = env::var("GATEWAY_DEMO_PARTNERS")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let metrics_enabled = env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        Self {
            backend_url,
            backend_timeout_ms,
            api_key_header,
            bind_address,
            admin_key,
            demo_partners,
            metrics_enabled,
        }
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    /// Builder-style override of the backend target, mostly for tests
    pub fn with_backend_url(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_url = backend_url.into();
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_admin_key(mut self, admin_key: impl Into<String>) -> Self {
        self.admin_key = Some(admin_key.into());
        self
    }
}
