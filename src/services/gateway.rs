//! The gate pipeline: authenticate, rate-limit, authorize, forward, audit.
//!
//! Every proxied request runs the same strictly ordered sequence and stops at
//! the first failing gate:
//!
//! 1. resolve the partner from its API key (401 unknown/missing, 403 deactivated)
//! 2. admit against the partner's sliding-window quota (429)
//! 3. check the requested service against the partner's allow-list (403)
//! 4. forward once to the backend (504 on timeout, 502 on transport failure)
//!
//! Only step 4 writes to the audit log, whatever its outcome.

use actix_web::{
    http::{
        header::{HeaderName, HeaderValue},
        StatusCode,
    },
    web::Bytes,
    HttpRequest, HttpResponse, ResponseError,
};
use std::{sync::Arc, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    config::{AuditConfig, GatewayConfig, RateLimitConfig},
    models::{AuditRecord, Partner, Service},
    services::{
        audit_log::AuditLog,
        forwarder::{BackendResponse, ForwardError, ForwardRequest, Forwarder, ForwarderConfig},
        metrics::AppMetrics,
        partners::PartnerRegistry,
        rate_limit::SlidingWindowLimiter,
    },
    utils::http::{extract_api_key, extract_client_ip, extract_request_id},
};

pub const RATE_LIMIT_LIMIT_HEADER: &str = "X-RateLimit-Limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "X-RateLimit-Remaining";
pub const RATE_LIMIT_RESET_HEADER: &str = "X-RateLimit-Reset";

/// Gateway-level failures, each mapped to one HTTP status
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Rate limit exceeded. Limit: {limit} requests per {window_seconds} seconds")]
    RateLimited {
        limit: usize,
        window_seconds: u64,
        remaining: usize,
        reset_seconds: u64,
    },

    #[error("{0}")]
    BackendTimeout(String),

    #[error("{0}")]
    BackendUnreachable(String),
}

impl GateError {
    /// Short label used for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            GateError::Unauthenticated(_) => "unauthenticated",
            GateError::Forbidden(_) => "forbidden",
            GateError::RateLimited { .. } => "rate_limited",
            GateError::BackendTimeout(_) => "backend_timeout",
            GateError::BackendUnreachable(_) => "backend_unreachable",
        }
    }
}

impl From<ForwardError> for GateError {
    fn from(err: ForwardError) -> Self {
        if err.is_timeout() {
            GateError::BackendTimeout(err.user_message())
        } else {
            GateError::BackendUnreachable(err.user_message())
        }
    }
}

impl ResponseError for GateError {
    fn status_code(&self) -> StatusCode {
        match self {
            GateError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GateError::Forbidden(_) => StatusCode::FORBIDDEN,
            GateError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GateError::BackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GateError::BackendUnreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut builder = HttpResponse::build(status);

        match self {
            GateError::Unauthenticated(_) => {
                builder.insert_header(("WWW-Authenticate", "API-Key"));
            }
            GateError::RateLimited {
                limit,
                remaining,
                reset_seconds,
                ..
            } => {
                builder
                    .insert_header((RATE_LIMIT_LIMIT_HEADER, limit.to_string()))
                    .insert_header((RATE_LIMIT_REMAINING_HEADER, remaining.to_string()))
                    .insert_header((RATE_LIMIT_RESET_HEADER, reset_seconds.to_string()))
                    .insert_header(("Retry-After", reset_seconds.to_string()));
            }
            _ => {}
        }

        builder.json(serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string()
        }))
    }
}

/// The parts of an inbound request the pipeline needs
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: String,
    /// Backend path the route maps to, e.g. `posts/1`
    pub backend_path: String,
    pub query: String,
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: Bytes,
    pub api_key: Option<String>,
    pub client_ip: Option<String>,
    pub request_id: Option<String>,
}

impl InboundRequest {
    /// Capture an actix request for forwarding to `backend_path`
    pub fn from_http(
        req: &HttpRequest,
        body: Bytes,
        backend_path: impl Into<String>,
        api_key_header: &str,
    ) -> Self {
        let headers = req
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect();
        let client_ip = Some(extract_client_ip(req)).filter(|ip| ip != "unknown");

        Self {
            method: req.method().as_str().to_string(),
            backend_path: backend_path.into(),
            query: req.query_string().to_string(),
            headers,
            body,
            api_key: extract_api_key(req, api_key_header),
            client_ip,
            request_id: extract_request_id(req),
        }
    }
}

/// Orchestrates the registry, limiter, forwarder and audit log
pub struct GatePipeline {
    registry: Arc<PartnerRegistry>,
    limiter: SlidingWindowLimiter,
    audit: Arc<AuditLog>,
    forwarder: Forwarder,
    metrics: Option<AppMetrics>,
}

impl GatePipeline {
    pub fn new(
        registry: Arc<PartnerRegistry>,
        limiter: SlidingWindowLimiter,
        audit: Arc<AuditLog>,
        forwarder: Forwarder,
    ) -> Self {
        Self {
            registry,
            limiter,
            audit,
            forwarder,
            metrics: None,
        }
    }

    /// Build every component from configuration
    pub fn from_config(
        gateway: &GatewayConfig,
        rate_limit: &RateLimitConfig,
        audit: &AuditConfig,
    ) -> Result<Self, ForwardError> {
        let registry = if gateway.demo_partners {
            PartnerRegistry::with_demo_partners()
        } else {
            PartnerRegistry::new()
        };
        let forwarder = Forwarder::new(ForwarderConfig::from(gateway))?;

        Ok(Self::new(
            Arc::new(registry),
            SlidingWindowLimiter::new(rate_limit.clone()),
            Arc::new(AuditLog::from_config(audit)),
            forwarder,
        ))
    }

    pub fn with_metrics(mut self, metrics: AppMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &PartnerRegistry {
        &self.registry
    }

    pub fn limiter(&self) -> &SlidingWindowLimiter {
        &self.limiter
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    pub fn api_key_header(&self) -> &str {
        &self.forwarder.config().api_key_header
    }

    /// Identity gate: resolve the key and require an active partner
    pub fn authenticate(&self, api_key: Option<&str>) -> Result<Partner, GateError> {
        let api_key = api_key.ok_or_else(|| {
            GateError::Unauthenticated(format!("{} header is required", self.api_key_header()))
        })?;

        let partner = self
            .registry
            .resolve(api_key)
            .ok_or_else(|| GateError::Unauthenticated("Invalid API key".to_string()))?;

        if !partner.is_active {
            return Err(GateError::Forbidden(
                "Partner account is deactivated".to_string(),
            ));
        }
        Ok(partner)
    }

    /// Quota gate: consume one slot of the partner's window or reject
    fn admit(&self, partner: &Partner) -> Result<(), GateError> {
        if self.limiter.allowed(&partner.id, partner.rate_limit) {
            debug!(partner_id = %partner.id, "Request admitted by rate limiter");
            return Ok(());
        }

        Err(GateError::RateLimited {
            limit: partner.rate_limit,
            window_seconds: self.limiter.window_seconds(),
            remaining: self.limiter.remaining(&partner.id, partner.rate_limit),
            reset_seconds: self.limiter.reset_seconds(&partner.id),
        })
    }

    /// Authorization gate: the service must be in the partner's allow-list
    fn authorize(&self, partner: &Partner, service: Service) -> Result<(), GateError> {
        if self.registry.authorize(partner, service) {
            return Ok(());
        }
        Err(GateError::Forbidden(format!(
            "Access denied to {service} service. Allowed services: [{}]",
            partner.service_names().join(", ")
        )))
    }

    /// Run gates 1-3 in order, short-circuiting on the first failure
    fn check_gates(&self, request: &InboundRequest, service: Service) -> Result<Partner, GateError> {
        let partner = self.authenticate(request.api_key.as_deref())?;
        self.admit(&partner)?;
        self.authorize(&partner, service)?;
        Ok(partner)
    }

    /// Gate and forward one request, producing exactly one response
    pub async fn handle(
        &self,
        request: InboundRequest,
        service: Service,
    ) -> Result<HttpResponse, GateError> {
        let start = Instant::now();

        let partner = match self.check_gates(&request, service) {
            Ok(partner) => partner,
            Err(err) => {
                warn!(
                    reason = err.reason(),
                    method = %request.method,
                    path = %request.backend_path,
                    service = %service,
                    client_ip = ?request.client_ip,
                    request_id = ?request.request_id,
                    message = %err,
                    "Request rejected by gateway"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejection(err.reason());
                }
                return Err(err);
            }
        };

        let mut headers = request.headers;
        if let Some(request_id) = &request.request_id {
            if !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("x-request-id"))
            {
                headers.push(("x-request-id".to_string(), request_id.as_bytes().to_vec()));
            }
        }

        let outcome = self
            .forwarder
            .forward(ForwardRequest {
                method: request.method.clone(),
                path: request.backend_path.clone(),
                query: request.query,
                headers,
                body: request.body,
            })
            .await;
        let elapsed = start.elapsed();

        let (status_code, error_message) = match &outcome {
            Ok(response) => (response.status, None),
            Err(err) if err.is_timeout() => (504, Some(err.user_message())),
            Err(err) => (502, Some(err.user_message())),
        };

        self.audit.record(
            AuditRecord::new(
                partner.id.as_str(),
                partner.name.as_str(),
                request.method.as_str(),
                request.backend_path.as_str(),
                service,
                status_code,
                elapsed.as_secs_f64() * 1000.0,
            )
            .with_client_ip(request.client_ip)
            .with_error(error_message)
            .with_request_id(request.request_id),
        );

        if let Some(metrics) = &self.metrics {
            let label = match &outcome {
                Ok(_) => "success",
                Err(err) if err.is_timeout() => "timeout",
                Err(_) => "unreachable",
            };
            metrics.record_backend(service.as_str(), label, elapsed);
        }

        let response = outcome?;
        info!(
            partner_id = %partner.id,
            service = %service,
            status = response.status,
            duration_ms = elapsed.as_millis(),
            "Request forwarded"
        );
        Ok(self.build_response(&partner, response))
    }

    /// Relay the backend response verbatim with the partner's quota headers
    fn build_response(&self, partner: &Partner, response: BackendResponse) -> HttpResponse {
        let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut builder = HttpResponse::build(status);

        for (name, value) in &response.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(value),
            ) {
                builder.append_header((name, value));
            }
        }

        let remaining = self.limiter.remaining(&partner.id, partner.rate_limit);
        builder
            .insert_header((RATE_LIMIT_LIMIT_HEADER, partner.rate_limit.to_string()))
            .insert_header((RATE_LIMIT_REMAINING_HEADER, remaining.to_string()));

        builder.body(response.body)
    }
}
