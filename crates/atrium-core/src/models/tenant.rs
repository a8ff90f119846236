//! Tenant domain model and projections.
//!
//! A tenant is an organizational grouping that scopes visibility of
//! users. Users relate to tenants through membership edges; the
//! association carries no attributes of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Globally unique, non-empty display name.
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Field the free-text `filter` option matches against.
    pub const TEXT_SEARCH_FIELD: &'static str = "name";
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Fields that can be updated on an existing tenant. `None` = no change.
#[derive(Debug, Clone, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// The only tenant shape embedded inside user projections, keeping
/// serialization depth bounded (a summary never embeds users back).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<&Tenant> for TenantSummary {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name.clone(),
        }
    }
}

/// Outward tenant projection. `notes` is populated only for callers
/// with member or admin visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantDto {
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantDto {
    pub fn from_tenant(tenant: Tenant, include_notes: bool) -> Self {
        Self {
            name: tenant.name,
            description: tenant.description,
            notes: if include_notes { tenant.notes } else { None },
            created_at: tenant.created_at,
            updated_at: tenant.updated_at,
        }
    }
}
