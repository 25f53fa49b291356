//! Partner API Gateway - an authenticating, rate-limiting reverse proxy
//!
//! Every proxied request passes a fixed sequence of gates before it reaches
//! the backend:
//! - API-key authentication against the partner registry
//! - a per-partner sliding-window rate limit
//! - per-service authorization
//! - a single forwarded call with a fixed deadline, recorded in the audit log
//!
//! ## Architecture
//!
//! - `models/` - partners, services, audit entries and API payloads
//! - `services/` - registry, rate limiter, audit log, forwarder, gate pipeline, metrics
//! - `handlers/` - system, partner and admin endpoints, proxied route table, app factory
//! - `middleware/` - request ids and request metrics
//! - `utils/` - request inspection helpers
//! - `config/` - environment-driven configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use partner_gateway::{create_app, AppState};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let state = AppState::from_env().expect("valid configuration");
//!     actix_web::HttpServer::new(move || create_app(state.clone()))
//!         .bind("127.0.0.1:8080")?
//!         .run()
//!         .await
//! }
//! ```

pub mod config;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

/// Short git commit the binary was built from
pub const BUILD_COMMIT: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// Build timestamp recorded by the build script
pub const BUILD_TIMESTAMP: &str = match option_env!("VERGEN_BUILD_TIMESTAMP") {
    Some(ts) => ts,
    None => "unknown",
};

pub use config::{AuditConfig, GatewayConfig, LoggingConfig, RateLimitConfig};
pub use handlers::{create_app, create_openapi_spec, AdminError, AppState, StartupError};
pub use middleware::{MetricsMiddleware, RequestId, RequestIdMiddleware};
pub use models::{AuditEntry, AuditRecord, AuditStats, Partner, Service};
pub use services::{
    AppMetrics, AuditLog, ForwardError, Forwarder, ForwarderConfig, GateError, GatePipeline,
    InboundRequest, PartnerRegistry, RegistryError, SlidingWindowLimiter,
};
