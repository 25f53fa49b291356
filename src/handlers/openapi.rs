//! OpenAPI specification generation and app factory.

use crate::{
    config::{AuditConfig, GatewayConfig, RateLimitConfig},
    handlers::{
        audit_logs, audit_stats, create_partner, deactivate_partner, get_metrics, health, info,
        list_partners, me, proxy,
    },
    middleware::{MetricsMiddleware, RequestIdMiddleware},
    services::{AppMetrics, ForwardError, GatePipeline},
};
use actix_web::App;
use paperclip::actix::{web, OpenApiExt};
use paperclip::v2::models::{DefaultApiRaw, Info};

/// Errors that prevent the gateway from starting
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid backend configuration: {0}")]
    Forwarder(#[from] ForwardError),

    #[error("failed to initialise metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Shared state handed to every worker
///
/// Built once before the server starts so that all workers see the same
/// registry, rate-limit windows and audit log.
#[derive(Clone)]
pub struct AppState {
    pub config: web::Data<GatewayConfig>,
    pub pipeline: web::Data<GatePipeline>,
    pub metrics: web::Data<AppMetrics>,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        rate_limit: &RateLimitConfig,
        audit: &AuditConfig,
    ) -> Result<Self, StartupError> {
        let metrics = AppMetrics::new()?;
        let mut pipeline = GatePipeline::from_config(&config, rate_limit, audit)?;
        if config.metrics_enabled {
            pipeline = pipeline.with_metrics(metrics.clone());
        }

        Ok(Self {
            config: web::Data::new(config),
            pipeline: web::Data::new(pipeline),
            metrics: web::Data::new(metrics),
        })
    }

    pub fn from_env() -> Result<Self, StartupError> {
        Self::new(
            GatewayConfig::from_env(),
            &RateLimitConfig::from_env(),
            &AuditConfig::from_env(),
        )
    }
}

/// Creates the OpenAPI document for the gateway's own endpoints
pub fn create_openapi_spec() -> DefaultApiRaw {
    DefaultApiRaw {
        info: Info {
            title: "Partner API Gateway".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: Some(
                "Authenticating, rate-limiting reverse proxy for partner integrations.\n\n\
                ## Authentication\n\
                Every proxied request and every partner endpoint requires the partner's API key \
                in the `X-API-Key` header (the header name is configurable).\n\
                \n\
                ## Rate limiting\n\
                Each partner has a quota of requests per sliding window (60 seconds by default). \
                Forwarded responses carry `X-RateLimit-Limit` and `X-RateLimit-Remaining`; \
                rejected requests get `429` with `Retry-After`.\n\
                \n\
                ## Proxied routes\n\
                `/api/users`, `/api/posts`, `/api/comments`, `/api/todos`, `/api/albums` and \
                `/api/photos` (plus their `/{id}` and nested forms) are forwarded verbatim to \
                the backend. They are not listed in this document.\n\
                \n\
                ## Administration\n\
                Creating and deactivating partners requires the `X-Admin-Key` header."
                    .into(),
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Creates the gateway application
///
/// Documented endpoints are registered through paperclip; the proxied route
/// table is added to the plain actix app after the OpenAPI document is built.
pub fn create_app(
    state: AppState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let metrics = MetricsMiddleware::when_enabled(state.config.metrics_enabled, &state.metrics);

    App::new()
        .wrap(RequestIdMiddleware)
        .wrap(metrics)
        .wrap_api_with_spec(create_openapi_spec())
        .app_data(state.config)
        .app_data(state.pipeline)
        .app_data(state.metrics)
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/info").route(web::get().to(info)))
        .service(web::resource("/metrics").route(web::get().to(get_metrics)))
        .service(web::resource("/me").route(web::get().to(me)))
        .service(
            web::resource("/admin/partners")
                .route(web::get().to(list_partners))
                .route(web::post().to(create_partner)),
        )
        .service(
            web::resource("/admin/partners/{id}/deactivate")
                .route(web::post().to(deactivate_partner)),
        )
        .service(web::resource("/admin/logs").route(web::get().to(audit_logs)))
        .service(web::resource("/admin/stats").route(web::get().to(audit_stats)))
        .with_json_spec_at("/api/spec/v2")
        .build()
        .configure(proxy::configure)
}
