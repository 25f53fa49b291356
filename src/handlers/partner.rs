//! Self-service endpoint for the calling partner.

use crate::{
    models::PartnerInfoResponse, services::GatePipeline, utils::http::extract_api_key,
};
use actix_web::{web, Error, HttpRequest, Result};
use paperclip::actix::api_v2_operation;

/// Describe the authenticated partner
///
/// Runs only the identity gate; calling it does not consume quota.
#[api_v2_operation(
    summary = "Current Partner",
    description = "Returns the calling partner's services, quota and remaining quota.",
    tags("Partner"),
    responses(
        (status = 200, description = "Successful response", body = PartnerInfoResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Partner account is deactivated")
    )
)]
pub async fn me(
    req: HttpRequest,
    pipeline: web::Data<GatePipeline>,
) -> Result<web::Json<PartnerInfoResponse>, Error> {
    let api_key = extract_api_key(&req, pipeline.api_key_header());
    let partner = pipeline.authenticate(api_key.as_deref())?;
    let remaining = pipeline
        .limiter()
        .remaining(&partner.id, partner.rate_limit);

    Ok(web::Json(PartnerInfoResponse {
        allowed_services: partner.service_names(),
        rate_limit_remaining: remaining,
        id: partner.id,
        name: partner.name,
        rate_limit: partner.rate_limit,
        is_active: partner.is_active,
    }))
}
