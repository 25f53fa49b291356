//! Partner identity records and the backend service tags they are authorized for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// Backend resource families exposed through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Users,
    Posts,
    Comments,
    Todos,
    Albums,
    Photos,
}

impl Service {
    /// Every service, in declaration order
    pub const ALL: [Service; 6] = [
        Service::Users,
        Service::Posts,
        Service::Comments,
        Service::Todos,
        Service::Albums,
        Service::Photos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Users => "users",
            Service::Posts => "posts",
            Service::Comments => "comments",
            Service::Todos => "todos",
            Service::Albums => "albums",
            Service::Photos => "photos",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Service::ALL
            .iter()
            .copied()
            .find(|service| service.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

/// An external caller with its own key, quota and authorization scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub api_key: String,
    pub allowed_services: BTreeSet<Service>,
    /// Requests admitted per rate-limit window
    pub rate_limit: usize,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Partner {
    /// True iff the partner is active and the service is in its allow-list
    pub fn can_access(&self, service: Service) -> bool {
        self.is_active && self.allowed_services.contains(&service)
    }

    /// Allowed service tags in a stable order, for diagnostics and listings
    pub fn service_names(&self) -> Vec<String> {
        self.allowed_services
            .iter()
            .map(|s| s.as_str().to_string())
            .collect()
    }
}
