//! HTTP utility functions for extracting request information.

use crate::middleware::RequestId;
use actix_web::{HttpMessage, HttpRequest};

/// Extract client IP address from request headers
///
/// Attempts to extract the real client IP from various proxy headers,
/// falling back to the connection remote address.
pub fn extract_client_ip(req: &HttpRequest) -> String {
    let ip_headers = [
        "X-Forwarded-For",
        "X-Real-IP",
        "CF-Connecting-IP", // Cloudflare
        "X-Cluster-Client-IP",
    ];

    for header_name in &ip_headers {
        if let Some(header_value) = req.headers().get(*header_name) {
            if let Ok(header_str) = header_value.to_str() {
                // X-Forwarded-For can contain multiple IPs, take the first one
                let ip = header_str.split(',').next().unwrap_or(header_str).trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}

/// Extract user agent from request headers
pub fn extract_user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract the partner API key from the configured header
///
/// An empty or non-UTF-8 value counts as missing.
pub fn extract_api_key(req: &HttpRequest, header_name: &str) -> Option<String> {
    req.headers()
        .get(header_name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Request id assigned by the request-id middleware, if it ran
pub fn extract_request_id(req: &HttpRequest) -> Option<String> {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
}
