//! Authentication configuration.
//!
//! Loaded once at startup and injected into the service; nothing in
//! this crate reads process environment at call time.

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for JWT signing (HS256).
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Access token lifetime in seconds (default: 3600 = 1 hour).
    pub token_lifetime_secs: u64,
    /// Email domain granting membership in the organization tenant on
    /// first external login (e.g. `example.com`). `None` disables the
    /// rule.
    pub organization_domain: Option<String>,
    /// Tenant name used when the organization domain rule matches.
    pub organization_tenant: String,
    /// Fallback tenant name for first-time external users.
    pub default_tenant: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "atrium".into(),
            token_lifetime_secs: 3600,
            organization_domain: None,
            organization_tenant: "Organization".into(),
            default_tenant: "Default".into(),
        }
    }
}
