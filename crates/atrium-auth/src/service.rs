//! Authentication service — credential verification and the external
//! identity-provider bridge.

use atrium_core::error::{AtriumError, AtriumResult};
use atrium_core::models::tenant::{NewTenant, Tenant, TenantSummary};
use atrium_core::models::user::{DEFAULT_ROLE, NewUser, User};
use atrium_core::repository::{MembershipRepository, TenantRepository, UserRepository};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Identity asserted by an external provider after its own token
/// exchange. Never constructed from caller-supplied request data.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Provider name recorded as the user's `source`, e.g. `MS`.
    pub source: String,
}

/// Profile returned alongside a freshly issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub role: String,
    pub tenants: Vec<TenantSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: AuthProfile,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct AuthService<U, T, M>
where
    U: UserRepository,
    T: TenantRepository,
    M: MembershipRepository,
{
    users: U,
    tenants: T,
    memberships: M,
    config: AuthConfig,
}

impl<U, T, M> AuthService<U, T, M>
where
    U: UserRepository,
    T: TenantRepository,
    M: MembershipRepository,
{
    pub fn new(users: U, tenants: T, memberships: M, config: AuthConfig) -> Self {
        Self {
            users,
            tenants,
            memberships,
            config,
        }
    }

    /// Authenticate with username/email + password and issue a token.
    ///
    /// "No such user" and "wrong password" are indistinguishable to
    /// the caller: both surface as the same `invalid credentials`
    /// failure.
    pub async fn verify_credentials(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> AtriumResult<AuthResponse> {
        let user = match self.users.get_by_username(username_or_email).await {
            Ok(u) => u,
            Err(AtriumError::NotFound { .. }) => self
                .users
                .get_by_email(username_or_email)
                .await
                .map_err(|e| match e {
                    AtriumError::NotFound { .. } => AuthError::InvalidCredentials.into(),
                    other => other,
                })?,
            Err(e) => return Err(e),
        };

        let valid =
            password::verify_password(password, &user.password_hash).map_err(AtriumError::from)?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.issue_for(user).await
    }

    /// Sign in a user whose identity was already asserted by an
    /// external provider; creates the user (and, if needed, its
    /// tenant) on first login. No password is verified on this path.
    pub async fn external_login(&self, identity: ExternalIdentity) -> AtriumResult<AuthResponse> {
        let user = match self.users.get_by_email(&identity.email).await {
            Ok(u) => u,
            Err(AtriumError::NotFound { .. }) => self.provision(identity).await?,
            Err(e) => return Err(e),
        };

        self.issue_for(user).await
    }

    /// Validate a previously issued token and return its claims.
    pub fn validate_token(&self, token: &str) -> AtriumResult<token::Claims> {
        token::decode(token, &self.config).map_err(AtriumError::from)
    }

    async fn issue_for(&self, user: User) -> AtriumResult<AuthResponse> {
        let tenants = self
            .memberships
            .tenants_for_user(user.id)
            .await?
            .iter()
            .map(TenantSummary::from)
            .collect();

        let access_token =
            token::issue(user.id, &user.username, &self.config).map_err(AtriumError::from)?;

        Ok(AuthResponse {
            access_token,
            user: AuthProfile {
                id: user.id,
                username: user.username,
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                role: user.role,
                tenants,
            },
        })
    }

    /// First external login: resolve the tenant from the email domain
    /// rule and create the user with an unusable placeholder password.
    async fn provision(&self, identity: ExternalIdentity) -> AtriumResult<User> {
        let tenant = self.resolve_tenant(&identity.email).await?;

        let placeholder = password::random_placeholder_hash().map_err(AtriumError::from)?;
        let user = self
            .users
            .create(NewUser {
                username: identity.email.clone(),
                email: identity.email.clone(),
                password_hash: placeholder,
                first_name: identity.first_name,
                last_name: identity.last_name,
                role: DEFAULT_ROLE.into(),
                source: identity.source,
            })
            .await?;

        self.memberships.add(user.id, tenant.id).await?;

        info!(
            user_id = %user.id,
            tenant = %tenant.name,
            source = %user.source,
            "Provisioned user from external identity"
        );

        Ok(user)
    }

    async fn resolve_tenant(&self, email: &str) -> AtriumResult<Tenant> {
        let name = match (&self.config.organization_domain, email.rsplit_once('@')) {
            (Some(org_domain), Some((_, domain))) if domain.eq_ignore_ascii_case(org_domain) => {
                self.config.organization_tenant.as_str()
            }
            _ => self.config.default_tenant.as_str(),
        };

        match self.tenants.get_by_name(name).await {
            Ok(tenant) => Ok(tenant),
            Err(AtriumError::NotFound { .. }) => {
                let created = self
                    .tenants
                    .create(NewTenant {
                        name: name.to_string(),
                        ..Default::default()
                    })
                    .await;
                match created {
                    Ok(tenant) => Ok(tenant),
                    // Lost a create race; the row exists now.
                    Err(AtriumError::AlreadyExists { .. }) => self.tenants.get_by_name(name).await,
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}
