//! User access service.

use atrium_auth::password;
use atrium_core::error::{AtriumError, AtriumResult};
use atrium_core::models::tenant::TenantSummary;
use atrium_core::models::user::{DEFAULT_ROLE, NewUser, SOURCE_LOCAL, UpdateUser, User, UserDto};
use atrium_core::query::{Predicate, QueryItem, QueryOptions, QueryResult};
use atrium_core::repository::{MembershipRepository, TenantRepository, UserRepository};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Canonical upsert payload. Every field is optional; the create path
/// enforces its own required set. Unknown fields are rejected at
/// deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpsertUser {
    pub username: Option<String>,
    pub email: Option<String>,
    /// Plaintext; hashed before it reaches storage.
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub source: Option<String>,
    /// On create only: tenant to add the new user to.
    pub tenant_id: Option<Uuid>,
}

/// User operations: lookup, paginated query, upsert, delete,
/// membership mutation, password changes.
pub struct UserAccess<U, T, M>
where
    U: UserRepository,
    T: TenantRepository,
    M: MembershipRepository,
{
    users: U,
    tenants: T,
    memberships: M,
}

impl<U, T, M> UserAccess<U, T, M>
where
    U: UserRepository,
    T: TenantRepository,
    M: MembershipRepository,
{
    pub fn new(users: U, tenants: T, memberships: M) -> Self {
        Self {
            users,
            tenants,
            memberships,
        }
    }

    /// Point lookup. Returns `None` for an unknown id; the projection
    /// never carries the password hash.
    pub async fn find_one(&self, id: Uuid) -> AtriumResult<Option<QueryItem<UserDto>>> {
        let user = match self.users.get_by_id(id).await {
            Ok(user) => user,
            Err(AtriumError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(Some(self.project(user).await?))
    }

    /// Paginated, filtered, ordered user listing.
    ///
    /// A `tenant_id` scope restricts the page to members of that
    /// tenant unless `all` is set. A tenant with no members yields an
    /// empty result rather than an unscoped page.
    pub async fn query(&self, options: &QueryOptions) -> AtriumResult<QueryResult<UserDto>> {
        let take = options.effective_take();
        let skip = options.effective_skip();
        let mut selection = options.selection(User::TEXT_SEARCH_FIELD);

        if let Some(tenant_id) = options.tenant_id
            && !options.all
        {
            let member_ids = self.memberships.user_ids_for_tenant(tenant_id).await?;
            if member_ids.is_empty() {
                return Ok(QueryResult::empty(take, skip));
            }
            selection.predicates.push(Predicate::IdIn(member_ids));
        }

        let (users, total) = self.users.search(selection).await?;

        let mut items = Vec::with_capacity(users.len());
        for user in users {
            items.push(self.project(user).await?);
        }

        Ok(QueryResult {
            items,
            total,
            take,
            skip,
        })
    }

    /// Create-or-update, returning the entity id only; callers chain
    /// it into membership and token-issuance calls.
    pub async fn upsert(&self, input: UpsertUser, id: Option<Uuid>) -> AtriumResult<Uuid> {
        match id {
            Some(id) => self.update_existing(id, input).await,
            None => self.create_new(input).await,
        }
    }

    /// Hard delete. Membership edges are removed with the user.
    pub async fn delete(&self, id: Uuid) -> AtriumResult<()> {
        self.users.delete(id).await?;
        info!(user_id = %id, "Deleted user");
        Ok(())
    }

    /// Add the user to a tenant. The user check runs before the
    /// tenant check inside the membership add; adding an existing
    /// member is a no-op.
    pub async fn add_to_tenant(&self, user_id: Uuid, tenant_id: Uuid) -> AtriumResult<()> {
        self.users.get_by_id(user_id).await?;
        self.memberships.add(user_id, tenant_id).await?;
        info!(user_id = %user_id, tenant_id = %tenant_id, "Added user to tenant");
        Ok(())
    }

    /// Replace the password after verifying the current one. The write
    /// is a compare-and-swap against the row's update timestamp, so a
    /// lost race surfaces as `ConcurrentUpdate` instead of silently
    /// dropping one of the changes.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AtriumResult<()> {
        let user = self.users.get_by_id(user_id).await?;

        let valid = password::verify_password(current_password, &user.password_hash)
            .map_err(AtriumError::from)?;
        if !valid {
            return Err(AtriumError::AuthenticationFailed {
                reason: "invalid credentials".into(),
            });
        }

        let hash = password::hash_password(new_password).map_err(AtriumError::from)?;
        self.users
            .set_password_hash(user_id, hash, user.updated_at)
            .await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Administrative reset: no current-password verification.
    pub async fn reset_password(&self, user_id: Uuid, new_password: &str) -> AtriumResult<()> {
        let user = self.users.get_by_id(user_id).await?;

        let hash = password::hash_password(new_password).map_err(AtriumError::from)?;
        self.users
            .set_password_hash(user_id, hash, user.updated_at)
            .await?;

        info!(user_id = %user_id, "Password reset");
        Ok(())
    }

    async fn update_existing(&self, id: Uuid, input: UpsertUser) -> AtriumResult<Uuid> {
        let password_hash = match input.password.as_deref() {
            Some(plaintext) => Some(password::hash_password(plaintext).map_err(AtriumError::from)?),
            None => None,
        };

        self.users
            .update(
                id,
                UpdateUser {
                    username: input.username,
                    email: input.email,
                    password_hash,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    role: input.role,
                    source: input.source,
                },
            )
            .await?;

        Ok(id)
    }

    async fn create_new(&self, input: UpsertUser) -> AtriumResult<Uuid> {
        let username = required(input.username, "username")?;
        let email = required(input.email, "email")?;
        let plaintext = required(input.password, "password")?;

        // A syntactically valid but nonexistent tenant id must fail
        // before the user row exists.
        if let Some(tenant_id) = input.tenant_id {
            self.tenants.get_by_id(tenant_id).await?;
        }

        let password_hash = password::hash_password(&plaintext).map_err(AtriumError::from)?;

        let user = self
            .users
            .create(NewUser {
                username,
                email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                role: input.role.unwrap_or_else(|| DEFAULT_ROLE.into()),
                source: input.source.unwrap_or_else(|| SOURCE_LOCAL.into()),
            })
            .await?;

        if let Some(tenant_id) = input.tenant_id {
            self.memberships.add(user.id, tenant_id).await?;
        }

        info!(user_id = %user.id, username = %user.username, "Created user");
        Ok(user.id)
    }

    async fn project(&self, user: User) -> AtriumResult<QueryItem<UserDto>> {
        let tenants = self
            .memberships
            .tenants_for_user(user.id)
            .await?
            .iter()
            .map(TenantSummary::from)
            .collect();

        let id = user.id;
        Ok(QueryItem {
            item: UserDto::from_user(user, tenants),
            id,
        })
    }
}

fn required(value: Option<String>, field: &str) -> AtriumResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AtriumError::Validation {
            message: format!("{field} is required"),
        }),
    }
}
