//! Health check and gateway information endpoint handlers.

use crate::{
    config::GatewayConfig,
    models::{HealthResponse, InfoResponse, Service},
};
use actix_web::{web, Error, HttpRequest, Result};
use paperclip::actix::api_v2_operation;

/// Health check endpoint
///
/// Returns the current health status of the gateway. This endpoint can be
/// used by load balancers and health checkers; it needs no API key.
#[api_v2_operation(
    summary = "Health Check Endpoint",
    description = "Returns the current health status of the gateway in JSON format.",
    tags("System"),
    responses(
        (status = 200, description = "Successful response", body = HealthResponse)
    )
)]
pub async fn health() -> Result<web::Json<HealthResponse>, Error> {
    Ok(web::Json(HealthResponse {
        status: "healthy".to_string(),
        service: "API Gateway".to_string(),
    }))
}

/// Gateway information endpoint
#[api_v2_operation(
    summary = "Gateway Information Endpoint",
    description = "Returns the gateway version, build details, backend target and proxied services.",
    tags("System"),
    responses(
        (status = 200, description = "Successful response", body = InfoResponse)
    )
)]
pub async fn info(req: HttpRequest) -> Result<web::Json<InfoResponse>, Error> {
    let backend_url = req
        .app_data::<web::Data<GatewayConfig>>()
        .map(|config| config.backend_url.clone())
        .unwrap_or_default();

    Ok(web::Json(InfoResponse {
        name: "Partner API Gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: crate::BUILD_COMMIT.to_string(),
        build_time: crate::BUILD_TIMESTAMP.to_string(),
        backend_url,
        available_services: Service::ALL.iter().map(|s| s.to_string()).collect(),
        documentation: "/api/spec/v2".to_string(),
    }))
}
