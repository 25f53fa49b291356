//! Partner registry: API-key authentication and per-service authorization.

use crate::models::{Partner, Service};
use chrono::Utc;
use parking_lot::RwLock;
use rand::{rngs::OsRng, RngCore};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

/// Quota assigned when a partner is created without one
pub const DEFAULT_PARTNER_RATE_LIMIT: usize = 60;

/// Random bytes in a generated key (128 bits)
const GENERATED_KEY_BYTES: usize = 16;

/// Errors raised by registry mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("API key is already assigned to another partner")]
    DuplicateKey,

    #[error("Partner '{0}' already exists")]
    DuplicateId(String),

    #[error("Unknown service '{0}'")]
    UnknownService(String),

    #[error("API key must be non-empty printable ASCII without surrounding whitespace")]
    InvalidKey,
}

#[derive(Default)]
struct RegistryInner {
    partners: HashMap<String, Partner>,
    /// api_key -> partner id
    key_index: HashMap<String, String>,
    /// Partner ids in creation order
    order: Vec<String>,
}

/// In-memory partner store
///
/// The canonical store is keyed by partner id; an auxiliary key index keeps
/// authentication on the hot path a single hash lookup. Records are never
/// removed, only deactivated, so keys are never reused.
#[derive(Default)]
pub struct PartnerRegistry {
    inner: RwLock<RegistryInner>,
}

impl PartnerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the three demo partners
    pub fn with_demo_partners() -> Self {
        let registry = Self::new();
        let seeds: [(&str, &str, &[Service], usize, &str); 3] = [
            (
                "partner-001",
                "Premium Partner Inc.",
                &Service::ALL[..],
                100,
                "premium-key-001",
            ),
            (
                "partner-002",
                "Basic Partner Ltd.",
                &[Service::Users, Service::Posts],
                30,
                "basic-key-002",
            ),
            (
                "partner-003",
                "Social Analytics Co.",
                &[Service::Posts, Service::Comments],
                50,
                "social-key-003",
            ),
        ];

        for (id, name, services, rate_limit, key) in seeds {
            if let Err(e) = registry.create(
                id,
                name,
                services.iter().copied().collect(),
                Some(rate_limit),
                Some(key.to_string()),
            ) {
                warn!(partner_id = id, error = %e, "Failed to seed demo partner");
            }
        }
        registry
    }

    /// Look up a partner by its secret key
    ///
    /// Deactivated partners still resolve, so callers can tell "deactivated"
    /// apart from "unknown key".
    pub fn resolve(&self, api_key: &str) -> Option<Partner> {
        let inner = self.inner.read();
        inner
            .key_index
            .get(api_key)
            .and_then(|id| inner.partners.get(id))
            .cloned()
    }

    /// Look up a partner by id
    pub fn get(&self, partner_id: &str) -> Option<Partner> {
        self.inner.read().partners.get(partner_id).cloned()
    }

    /// True iff the partner is active and allowed to call the service
    pub fn authorize(&self, partner: &Partner, service: Service) -> bool {
        // Re-read the live record so a deactivation is honored immediately
        match self.inner.read().partners.get(&partner.id) {
            Some(current) => current.can_access(service),
            None => partner.can_access(service),
        }
    }

    /// Register a new partner
    ///
    /// A random key is generated when none is supplied. A supplied key must
    /// survive header extraction unchanged, otherwise it could never
    /// authenticate.
    pub fn create(
        &self,
        id: &str,
        name: &str,
        allowed_services: BTreeSet<Service>,
        rate_limit: Option<usize>,
        api_key: Option<String>,
    ) -> Result<Partner, RegistryError> {
        let api_key = match api_key {
            Some(key) if !is_usable_key(&key) => return Err(RegistryError::InvalidKey),
            Some(key) => key,
            None => generate_api_key(),
        };

        let mut inner = self.inner.write();
        if inner.key_index.contains_key(&api_key) {
            return Err(RegistryError::DuplicateKey);
        }
        if inner.partners.contains_key(id) {
            return Err(RegistryError::DuplicateId(id.to_string()));
        }

        let partner = Partner {
            id: id.to_string(),
            name: name.to_string(),
            api_key: api_key.clone(),
            allowed_services,
            rate_limit: rate_limit.unwrap_or(DEFAULT_PARTNER_RATE_LIMIT),
            is_active: true,
            created_at: Utc::now(),
        };

        inner.key_index.insert(api_key, partner.id.clone());
        inner.partners.insert(partner.id.clone(), partner.clone());
        inner.order.push(partner.id.clone());

        info!(
            partner_id = %partner.id,
            partner_name = %partner.name,
            rate_limit = partner.rate_limit,
            services = ?partner.service_names(),
            "Partner registered"
        );

        Ok(partner)
    }

    /// All partners in creation order
    pub fn list(&self) -> Vec<Partner> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.partners.get(id))
            .cloned()
            .collect()
    }

    /// Clear a partner's active flag; returns whether the partner exists
    pub fn deactivate(&self, partner_id: &str) -> bool {
        let mut inner = self.inner.write();
        match inner.partners.get_mut(partner_id) {
            Some(partner) => {
                partner.is_active = false;
                info!(partner_id = %partner_id, "Partner deactivated");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Printable ASCII (space allowed inside), no leading or trailing whitespace
fn is_usable_key(key: &str) -> bool {
    !key.is_empty()
        && key.trim() == key
        && key.bytes().all(|b| b == b' ' || b.is_ascii_graphic())
}

/// Parse service tags, rejecting unknown ones
pub fn parse_services<S: AsRef<str>>(tags: &[S]) -> Result<BTreeSet<Service>, RegistryError> {
    tags.iter()
        .map(|tag| {
            tag.as_ref()
                .parse::<Service>()
                .map_err(RegistryError::UnknownService)
        })
        .collect()
}

/// Generate a `key-<32 hex>` key from the OS random source
fn generate_api_key() -> String {
    let mut bytes = [0u8; GENERATED_KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format!("key-{}", hex::encode(bytes))
}
