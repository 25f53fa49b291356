//! Outbound forwarding of gated requests to the backend service.
//!
//! This module provides the single-attempt HTTP client used by the gate
//! pipeline:
//! - Copies method, query string, headers and raw body to the backend
//! - Enforces one fixed deadline covering the call and the body read
//! - Distinguishes "timed out" from every other transport failure
//! - Never retries; forwarded methods are not guaranteed idempotent

use actix_web::web::Bytes;
use reqwest::{
    header::{HeaderMap as OutboundHeaders, HeaderName, HeaderValue},
    Client, Method,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};
use url::Url;

use crate::config::GatewayConfig;

/// Inbound headers never copied to the backend (compared lowercase)
pub const EXCLUDED_REQUEST_HEADERS: [&str; 3] = ["host", "content-length", "transfer-encoding"];

/// Backend response headers never copied back to the caller
pub const HOP_BY_HOP_RESPONSE_HEADERS: [&str; 3] =
    ["transfer-encoding", "content-encoding", "connection"];

/// Configuration for the forwarder
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    pub backend_url: String,
    pub timeout: Duration,
    /// Header carrying the partner key; stripped before forwarding
    pub api_key_header: String,
}

impl From<&GatewayConfig> for ForwarderConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            backend_url: config.backend_url.clone(),
            timeout: config.backend_timeout(),
            api_key_header: config.api_key_header.clone(),
        }
    }
}

/// A request ready to be sent to the backend
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: String,
    /// Backend path relative to the base URL, e.g. `posts/1`
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: String,
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: Bytes,
}

/// Backend status, headers and body, already stripped of hop-by-hop headers
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: u16,
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: Bytes,
    pub elapsed: Duration,
}

/// Errors that can occur while forwarding
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Backend service timeout after {0:?}")]
    Timeout(Duration),

    #[error("Backend service error: {0}")]
    Unreachable(String),

    #[error("Invalid backend target: {0}")]
    InvalidTarget(String),
}

impl ForwardError {
    /// Get a caller-facing error message for gateway responses
    pub fn user_message(&self) -> String {
        match self {
            ForwardError::Timeout(_) => "Backend service timeout".to_string(),
            ForwardError::Unreachable(detail) => format!("Backend service error: {detail}"),
            ForwardError::InvalidTarget(detail) => format!("Backend service error: {detail}"),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ForwardError::Timeout(_))
    }
}

/// Single-attempt HTTP forwarder
#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    config: ForwarderConfig,
    base_url: String,
    destination: String,
}

impl Forwarder {
    /// Create a forwarder; fails if the backend URL does not parse
    pub fn new(config: ForwarderConfig) -> Result<Self, ForwardError> {
        let parsed = Url::parse(&config.backend_url)
            .map_err(|e| ForwardError::InvalidTarget(format!("{}: {e}", config.backend_url)))?;
        let destination = parsed.host_str().unwrap_or("unknown").to_string();

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ForwardError::InvalidTarget(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            destination,
            config,
        })
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    pub fn backend_url(&self) -> &str {
        &self.base_url
    }

    /// Full backend URL for a path and query string
    pub fn target_url(&self, path: &str, query: &str) -> String {
        let mut url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// True if an inbound header must not be copied to the backend
    pub fn is_excluded_header(&self, name: &str) -> bool {
        EXCLUDED_REQUEST_HEADERS
            .iter()
            .any(|excluded| name.eq_ignore_ascii_case(excluded))
            || name.eq_ignore_ascii_case(&self.config.api_key_header)
    }

    /// Issue the backend call once, bounded by the configured timeout
    pub async fn forward(&self, request: ForwardRequest) -> Result<BackendResponse, ForwardError> {
        let url = self.target_url(&request.path, &request.query);
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| ForwardError::InvalidTarget(format!("method {}: {e}", request.method)))?;

        let mut headers = OutboundHeaders::new();
        for (name, value) in &request.headers {
            if self.is_excluded_header(name) {
                continue;
            }
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => debug!(header = %name, "Skipping header that cannot be forwarded"),
            }
        }

        let mut builder = self.client.request(method, &url).headers(headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let start = Instant::now();
        let timeout = self.config.timeout;

        let call = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter(|(name, _)| {
                    !HOP_BY_HOP_RESPONSE_HEADERS
                        .iter()
                        .any(|hop| name.as_str().eq_ignore_ascii_case(hop))
                })
                .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
                .collect::<Vec<_>>();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, body))
        };

        match tokio::time::timeout(timeout, call).await {
            Ok(Ok((status, headers, body))) => {
                let elapsed = start.elapsed();
                debug!(
                    destination = %self.destination,
                    method = %request.method,
                    url = %url,
                    status = status,
                    duration_ms = elapsed.as_millis(),
                    "Backend request completed"
                );
                Ok(BackendResponse {
                    status,
                    headers,
                    body,
                    elapsed,
                })
            }
            Ok(Err(e)) if e.is_timeout() => {
                warn!(
                    destination = %self.destination,
                    method = %request.method,
                    url = %url,
                    timeout_ms = timeout.as_millis(),
                    "Backend request timed out"
                );
                Err(ForwardError::Timeout(timeout))
            }
            Ok(Err(e)) => {
                error!(
                    destination = %self.destination,
                    method = %request.method,
                    url = %url,
                    error = %e,
                    duration_ms = start.elapsed().as_millis(),
                    "Backend request failed with network error"
                );
                Err(ForwardError::Unreachable(e.to_string()))
            }
            Err(_) => {
                warn!(
                    destination = %self.destination,
                    method = %request.method,
                    url = %url,
                    timeout_ms = timeout.as_millis(),
                    "Backend request timed out"
                );
                Err(ForwardError::Timeout(timeout))
            }
        }
    }
}
