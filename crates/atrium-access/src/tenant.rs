//! Tenant access service.

use atrium_core::error::{AtriumError, AtriumResult};
use atrium_core::models::tenant::{NewTenant, Tenant, TenantDto, TenantSummary, UpdateTenant};
use atrium_core::models::user::UserDto;
use atrium_core::query::{Predicate, QueryItem, QueryOptions, QueryResult};
use atrium_core::repository::{MembershipRepository, TenantRepository, UserRepository};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Canonical upsert payload for tenants. Unknown fields are rejected
/// at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpsertTenant {
    pub name: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Tenant operations: lookup, paginated query, upsert, delete, and
/// membership listing/removal from the tenant side.
pub struct TenantAccess<T, M, U>
where
    T: TenantRepository,
    M: MembershipRepository,
    U: UserRepository,
{
    tenants: T,
    memberships: M,
    users: U,
}

impl<T, M, U> TenantAccess<T, M, U>
where
    T: TenantRepository,
    M: MembershipRepository,
    U: UserRepository,
{
    pub fn new(tenants: T, memberships: M, users: U) -> Self {
        Self {
            tenants,
            memberships,
            users,
        }
    }

    /// Point lookup. Returns `None` for an unknown id.
    ///
    /// `notes` is visible only to admin-role callers and to members of
    /// the tenant; with no caller context it is withheld.
    pub async fn find_one(
        &self,
        id: Uuid,
        current_user_id: Option<Uuid>,
    ) -> AtriumResult<Option<QueryItem<TenantDto>>> {
        let tenant = match self.tenants.get_by_id(id).await {
            Ok(tenant) => tenant,
            Err(AtriumError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let include_notes = match current_user_id {
            Some(user_id) => self.can_see_notes(user_id, id).await?,
            None => false,
        };

        Ok(Some(QueryItem {
            item: TenantDto::from_tenant(tenant, include_notes),
            id,
        }))
    }

    /// Lookup by the unique tenant name. Returns `None` if absent.
    pub async fn find_by_name(&self, name: &str) -> AtriumResult<Option<Tenant>> {
        match self.tenants.get_by_name(name).await {
            Ok(tenant) => Ok(Some(tenant)),
            Err(AtriumError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Paginated, filtered, ordered tenant listing.
    ///
    /// Unless `all` is set: a `tenant_id` scope pins the result to
    /// that single tenant; a `user_id` scope restricts to tenants the
    /// user is a member of, or with `exclude_mine` to tenants the user
    /// is NOT a member of. A user with zero memberships gets an empty
    /// result for the inclusive scope and an unrestricted one for the
    /// inverted scope.
    pub async fn query(&self, options: &QueryOptions) -> AtriumResult<QueryResult<TenantDto>> {
        let take = options.effective_take();
        let skip = options.effective_skip();
        let mut selection = options.selection(Tenant::TEXT_SEARCH_FIELD);

        if !options.all {
            if let Some(tenant_id) = options.tenant_id {
                selection.predicates.push(Predicate::IdIn(vec![tenant_id]));
            }

            if let Some(user_id) = options.user_id {
                let member_ids = self.memberships.tenant_ids_for_user(user_id).await?;
                if options.exclude_mine {
                    if !member_ids.is_empty() {
                        selection.predicates.push(Predicate::IdNotIn(member_ids));
                    }
                } else {
                    if member_ids.is_empty() {
                        return Ok(QueryResult::empty(take, skip));
                    }
                    selection.predicates.push(Predicate::IdIn(member_ids));
                }
            }
        }

        let (tenants, total) = self.tenants.search(selection).await?;

        // List projections never carry notes; notes are a detail-view
        // field gated on caller visibility in `find_one`.
        let items = tenants
            .into_iter()
            .map(|tenant| {
                let id = tenant.id;
                QueryItem {
                    item: TenantDto::from_tenant(tenant, false),
                    id,
                }
            })
            .collect();

        Ok(QueryResult {
            items,
            total,
            take,
            skip,
        })
    }

    /// Create-or-update, returning the entity id only.
    pub async fn upsert(&self, input: UpsertTenant, id: Option<Uuid>) -> AtriumResult<Uuid> {
        match id {
            Some(id) => {
                self.tenants
                    .update(
                        id,
                        UpdateTenant {
                            name: input.name,
                            description: input.description,
                            notes: input.notes,
                        },
                    )
                    .await?;
                Ok(id)
            }
            None => {
                let name = match input.name {
                    Some(name) if !name.trim().is_empty() => name,
                    _ => {
                        return Err(AtriumError::Validation {
                            message: "name is required".into(),
                        });
                    }
                };

                let tenant = self
                    .tenants
                    .create(NewTenant {
                        name,
                        description: input.description,
                        notes: input.notes,
                    })
                    .await?;

                info!(tenant_id = %tenant.id, name = %tenant.name, "Created tenant");
                Ok(tenant.id)
            }
        }
    }

    /// Hard delete. Membership edges are removed with the tenant.
    pub async fn delete(&self, id: Uuid) -> AtriumResult<()> {
        self.tenants.delete(id).await?;
        info!(tenant_id = %id, "Deleted tenant");
        Ok(())
    }

    /// Members of the tenant, projected. Fails with `NotFound` for an
    /// unknown tenant rather than returning an empty list.
    pub async fn users(&self, tenant_id: Uuid) -> AtriumResult<Vec<QueryItem<UserDto>>> {
        self.tenants.get_by_id(tenant_id).await?;

        let members = self.memberships.users_for_tenant(tenant_id).await?;

        let mut items = Vec::with_capacity(members.len());
        for user in members {
            let tenants = self
                .memberships
                .tenants_for_user(user.id)
                .await?
                .iter()
                .map(TenantSummary::from)
                .collect();
            let id = user.id;
            items.push(QueryItem {
                item: UserDto::from_user(user, tenants),
                id,
            });
        }

        Ok(items)
    }

    /// Remove a user from the tenant; no-ops if the pair is absent.
    pub async fn remove_user(&self, tenant_id: Uuid, user_id: Uuid) -> AtriumResult<()> {
        self.memberships.remove(user_id, tenant_id).await?;
        info!(user_id = %user_id, tenant_id = %tenant_id, "Removed user from tenant");
        Ok(())
    }

    async fn can_see_notes(&self, user_id: Uuid, tenant_id: Uuid) -> AtriumResult<bool> {
        let user = match self.users.get_by_id(user_id).await {
            Ok(user) => user,
            // Unknown caller id: no visibility, not an error.
            Err(AtriumError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };

        if user.is_admin() {
            return Ok(true);
        }

        let member_ids = self.memberships.tenant_ids_for_user(user_id).await?;
        Ok(member_ids.contains(&tenant_id))
    }
}
