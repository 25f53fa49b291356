//! Administrative endpoints: partner management and audit log access.
//!
//! Reads require any valid partner key. Mutations additionally require the
//! `X-Admin-Key` header to match the configured admin key; with no admin key
//! configured they are always refused.

use crate::{
    config::GatewayConfig,
    models::{
        AuditEntryView, AuditStats, CreatePartnerRequest, CreatePartnerResponse,
        DeactivateResponse, LogQuery, PartnerSummary,
    },
    services::{parse_services, GatePipeline, RegistryError},
    utils::http::{extract_api_key, extract_client_ip},
};
use actix_web::{http::StatusCode, web, Error, HttpRequest, HttpResponse, ResponseError, Result};
use paperclip::actix::api_v2_operation;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Upper bound on entries returned by one log query
const MAX_LOG_LIMIT: usize = 1000;

/// Failures of the administrative surface, rendered with the same JSON
/// envelope as gate rejections
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Administrative access required")]
    Forbidden,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
}

impl ResponseError for AdminError {
    fn status_code(&self) -> StatusCode {
        match self {
            AdminError::Forbidden => StatusCode::FORBIDDEN,
            AdminError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string()
        }))
    }
}

impl From<RegistryError> for AdminError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateKey | RegistryError::DuplicateId(_) => {
                AdminError::Conflict(err.to_string())
            }
            RegistryError::UnknownService(_) | RegistryError::InvalidKey => {
                AdminError::BadRequest(err.to_string())
            }
        }
    }
}

fn require_partner(req: &HttpRequest, pipeline: &GatePipeline) -> Result<(), Error> {
    let api_key = extract_api_key(req, pipeline.api_key_header());
    pipeline.authenticate(api_key.as_deref())?;
    Ok(())
}

fn require_admin(req: &HttpRequest, config: &GatewayConfig) -> Result<(), AdminError> {
    let provided = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    let authorized = match (config.admin_key.as_deref(), provided) {
        (Some(expected), Some(provided)) => constant_time_eq(expected.as_bytes(), provided.as_bytes()),
        _ => false,
    };

    if !authorized {
        warn!(
            ip = %extract_client_ip(req),
            path = %req.path(),
            "Rejected administrative request"
        );
        return Err(AdminError::Forbidden);
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// List all partners in creation order
#[api_v2_operation(
    summary = "List Partners",
    description = "Returns every registered partner. API keys are never included.",
    tags("Admin"),
    responses(
        (status = 200, description = "Partners in creation order"),
        (status = 401, description = "Missing or invalid API key")
    )
)]
pub async fn list_partners(
    req: HttpRequest,
    pipeline: web::Data<GatePipeline>,
) -> Result<web::Json<Vec<PartnerSummary>>, Error> {
    require_partner(&req, &pipeline)?;
    let partners = pipeline
        .registry()
        .list()
        .iter()
        .map(PartnerSummary::from)
        .collect();
    Ok(web::Json(partners))
}

/// Recent audit entries, optionally for one partner
#[api_v2_operation(
    summary = "Audit Log",
    description = "Returns up to `limit` of the most recent audit entries, oldest first.",
    tags("Admin"),
    responses(
        (status = 200, description = "Audit entries, oldest first"),
        (status = 401, description = "Missing or invalid API key")
    )
)]
pub async fn audit_logs(
    req: HttpRequest,
    pipeline: web::Data<GatePipeline>,
    query: web::Query<LogQuery>,
) -> Result<web::Json<Vec<AuditEntryView>>, Error> {
    require_partner(&req, &pipeline)?;
    let limit = query.limit.min(MAX_LOG_LIMIT);

    let entries = match query.partner_id.as_deref() {
        Some(partner_id) => pipeline.audit_log().by_partner(partner_id, limit),
        None => pipeline.audit_log().recent(limit),
    };
    Ok(web::Json(entries.iter().map(AuditEntryView::from).collect()))
}

/// Aggregate statistics over the retained audit entries
#[api_v2_operation(
    summary = "Audit Statistics",
    tags("Admin"),
    responses(
        (status = 200, description = "Successful response", body = AuditStats),
        (status = 401, description = "Missing or invalid API key")
    )
)]
pub async fn audit_stats(
    req: HttpRequest,
    pipeline: web::Data<GatePipeline>,
) -> Result<web::Json<AuditStats>, Error> {
    require_partner(&req, &pipeline)?;
    Ok(web::Json(pipeline.audit_log().stats()))
}

/// Register a new partner
#[api_v2_operation(
    summary = "Create Partner",
    description = "Registers a partner. The API key is returned once, in this response only.",
    tags("Admin"),
    responses(
        (status = 201, description = "Partner created", body = CreatePartnerResponse),
        (status = 400, description = "Unknown service name or unusable API key"),
        (status = 403, description = "Administrative access required"),
        (status = 409, description = "Partner id or API key already exists")
    )
)]
pub async fn create_partner(
    req: HttpRequest,
    pipeline: web::Data<GatePipeline>,
    config: web::Data<GatewayConfig>,
    body: web::Json<CreatePartnerRequest>,
) -> Result<HttpResponse, Error> {
    require_admin(&req, &config)?;
    let body = body.into_inner();

    if body.id.trim().is_empty() || body.name.trim().is_empty() {
        return Err(AdminError::BadRequest("Partner id and name are required".into()).into());
    }

    let services = parse_services(&body.allowed_services[..]).map_err(AdminError::from)?;
    let partner = pipeline
        .registry()
        .create(&body.id, &body.name, services, body.rate_limit, body.api_key)
        .map_err(AdminError::from)?;

    info!(partner_id = %partner.id, "Partner created via admin API");

    Ok(HttpResponse::Created().json(CreatePartnerResponse {
        api_key: partner.api_key.clone(),
        partner: PartnerSummary::from(&partner),
    }))
}

/// Deactivate a partner; its key stops authenticating immediately
#[api_v2_operation(
    summary = "Deactivate Partner",
    tags("Admin"),
    responses(
        (status = 200, description = "Partner deactivated", body = DeactivateResponse),
        (status = 403, description = "Administrative access required"),
        (status = 404, description = "Unknown partner id")
    )
)]
pub async fn deactivate_partner(
    req: HttpRequest,
    pipeline: web::Data<GatePipeline>,
    config: web::Data<GatewayConfig>,
    path: web::Path<String>,
) -> Result<web::Json<DeactivateResponse>, Error> {
    require_admin(&req, &config)?;
    let partner_id = path.into_inner();

    if !pipeline.registry().deactivate(&partner_id) {
        return Err(AdminError::NotFound(format!("Partner '{partner_id}' not found")).into());
    }

    info!(partner_id = %partner_id, "Partner deactivated via admin API");
    Ok(web::Json(DeactivateResponse {
        id: partner_id,
        deactivated: true,
    }))
}
