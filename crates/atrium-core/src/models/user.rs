//! User domain model and projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::tenant::TenantSummary;

/// Default role assigned to newly created users.
pub const DEFAULT_ROLE: &str = "user";

/// Identity source for users created through local signup.
pub const SOURCE_LOCAL: &str = "LOCAL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2id PHC-format digest. Never included in any outward
    /// projection — see [`UserDto`].
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Free-form role string, e.g. `user` or `admin`.
    pub role: String,
    /// Origin of the identity: `LOCAL`, or an external provider name.
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Field the free-text `filter` option matches against.
    pub const TEXT_SEARCH_FIELD: &'static str = "username";

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Storage-layer input for creating a user. The password is already
/// hashed by the time it reaches a repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub source: String,
}

/// Fields that can be updated on an existing user. `None` = no change.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub source: Option<String>,
}

/// Outward user projection. There is deliberately no password field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub source: String,
    /// Tenant memberships, depth-limited to id/name pairs.
    pub tenants: Vec<TenantSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDto {
    pub fn from_user(user: User, tenants: Vec<TenantSummary>) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            source: user.source,
            tenants,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
