//! API request and response models for the gateway's own endpoints.

use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

use super::{audit::AuditEntry, partner::Partner};

/// Response model for the health check endpoint
#[derive(Clone, Serialize, Deserialize, Apiv2Schema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Response model for the gateway information endpoint
#[derive(Clone, Serialize, Deserialize, Apiv2Schema)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub commit: String,
    pub build_time: String,
    pub backend_url: String,
    pub available_services: Vec<String>,
    pub documentation: String,
}

/// Public view of a partner; never includes the key
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct PartnerSummary {
    pub id: String,
    pub name: String,
    pub allowed_services: Vec<String>,
    pub rate_limit: usize,
    pub is_active: bool,
    pub created_at: String,
}

impl From<&Partner> for PartnerSummary {
    fn from(partner: &Partner) -> Self {
        Self {
            id: partner.id.clone(),
            name: partner.name.clone(),
            allowed_services: partner.service_names(),
            rate_limit: partner.rate_limit,
            is_active: partner.is_active,
            created_at: partner.created_at.to_rfc3339(),
        }
    }
}

/// Response model for `GET /me`
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct PartnerInfoResponse {
    pub id: String,
    pub name: String,
    pub allowed_services: Vec<String>,
    pub rate_limit: usize,
    pub rate_limit_remaining: usize,
    pub is_active: bool,
}

/// Request body for creating a partner
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct CreatePartnerRequest {
    pub id: String,
    pub name: String,
    pub allowed_services: Vec<String>,
    /// Requests per window; defaults to 60
    pub rate_limit: Option<usize>,
    /// Explicit key; a random one is generated when absent
    pub api_key: Option<String>,
}

/// Response for a newly created partner, the only place a key is returned
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct CreatePartnerResponse {
    pub partner: PartnerSummary,
    pub api_key: String,
}

/// Response for partner deactivation
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct DeactivateResponse {
    pub id: String,
    pub deactivated: bool,
}

/// Query parameters for the audit log listing
#[derive(Debug, Deserialize, Apiv2Schema)]
pub struct LogQuery {
    /// Maximum number of entries (default: 100)
    #[serde(default = "default_log_limit")]
    pub limit: usize,
    /// Restrict to one partner id
    pub partner_id: Option<String>,
}

fn default_log_limit() -> usize {
    100
}

/// Audit entry as rendered by the admin API
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct AuditEntryView {
    pub id: String,
    pub timestamp: String,
    pub partner_id: String,
    pub partner: String,
    pub method: String,
    pub path: String,
    pub service: String,
    pub status_code: u16,
    pub response_time_ms: f64,
    pub client_ip: Option<String>,
    pub error_message: Option<String>,
    pub request_id: Option<String>,
}

impl From<&AuditEntry> for AuditEntryView {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: entry.display_id(),
            timestamp: entry.timestamp.to_rfc3339(),
            partner_id: entry.partner_id.clone(),
            partner: entry.partner_name.clone(),
            method: entry.method.clone(),
            path: entry.path.clone(),
            service: entry.service.to_string(),
            status_code: entry.status_code,
            response_time_ms: (entry.response_time_ms * 100.0).round() / 100.0,
            client_ip: entry.client_ip.clone(),
            error_message: entry.error_message.clone(),
            request_id: entry.request_id.clone(),
        }
    }
}
