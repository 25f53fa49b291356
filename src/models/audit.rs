//! Audit trail data structures for forwarded requests.

use chrono::{DateTime, Utc};
use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use super::partner::Service;

/// Fields of a forwarded attempt, before the audit log stamps it
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub partner_id: String,
    pub partner_name: String,
    pub method: String,
    pub path: String,
    pub service: Service,
    pub status_code: u16,
    pub response_time_ms: f64,
    pub client_ip: Option<String>,
    pub error_message: Option<String>,
    pub request_id: Option<String>,
}

impl AuditRecord {
    /// Create a record with the mandatory fields of a forwarded attempt
    pub fn new(
        partner_id: impl Into<String>,
        partner_name: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        service: Service,
        status_code: u16,
        response_time_ms: f64,
    ) -> Self {
        Self {
            partner_id: partner_id.into(),
            partner_name: partner_name.into(),
            method: method.into(),
            path: path.into(),
            service,
            status_code,
            response_time_ms,
            client_ip: None,
            error_message: None,
            request_id: None,
        }
    }

    pub fn with_client_ip(mut self, client_ip: Option<String>) -> Self {
        self.client_ip = client_ip;
        self
    }

    pub fn with_error(mut self, error_message: Option<String>) -> Self {
        self.error_message = error_message;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

/// One immutable record of a forwarded request's outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic sequence number, starting at 1
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub partner_id: String,
    /// Denormalized so reports stay readable after deactivation
    pub partner_name: String,
    pub method: String,
    pub path: String,
    pub service: Service,
    pub status_code: u16,
    pub response_time_ms: f64,
    pub client_ip: Option<String>,
    pub error_message: Option<String>,
    pub request_id: Option<String>,
}

impl AuditEntry {
    pub(crate) fn from_record(sequence: u64, record: AuditRecord) -> Self {
        Self {
            sequence,
            timestamp: Utc::now(),
            partner_id: record.partner_id,
            partner_name: record.partner_name,
            method: record.method,
            path: record.path,
            service: record.service,
            status_code: record.status_code,
            response_time_ms: record.response_time_ms,
            client_ip: record.client_ip,
            error_message: record.error_message,
            request_id: record.request_id,
        }
    }

    /// Human-facing identifier, e.g. `req-00000042`
    pub fn display_id(&self) -> String {
        format!("req-{:08}", self.sequence)
    }

    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }

    /// Emit the entry as a structured tracing event
    pub fn log(&self) {
        info!(
            target: "gateway_audit",
            id = %self.display_id(),
            partner_id = %self.partner_id,
            partner_name = %self.partner_name,
            method = %self.method,
            path = %self.path,
            service = %self.service,
            status = self.status_code,
            response_time_ms = self.response_time_ms,
            client_ip = ?self.client_ip,
            request_id = ?self.request_id,
            error = ?self.error_message,
            "Forwarded request"
        );
    }
}

/// Aggregates over the retained audit history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Apiv2Schema)]
pub struct AuditStats {
    pub total_requests: usize,
    pub requests_by_service: HashMap<String, usize>,
    pub requests_by_partner: HashMap<String, usize>,
    pub error_count: usize,
    pub avg_response_time_ms: f64,
}
