//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Point lookups return
//! `NotFound` errors rather than options; callers that want optional
//! semantics map the error at the service layer.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AtriumResult;
use crate::models::tenant::{NewTenant, Tenant, UpdateTenant};
use crate::models::user::{NewUser, UpdateUser, User};
use crate::query::Selection;

pub trait UserRepository: Send + Sync {
    fn create(&self, input: NewUser) -> impl Future<Output = AtriumResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AtriumResult<User>> + Send;
    fn get_by_username(&self, username: &str) -> impl Future<Output = AtriumResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = AtriumResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = AtriumResult<User>> + Send;

    /// Store a new password hash with a compare-and-swap on the row's
    /// update timestamp. Fails with `ConcurrentUpdate` if the row
    /// changed since `expected_updated_at` was read.
    fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: String,
        expected_updated_at: DateTime<Utc>,
    ) -> impl Future<Output = AtriumResult<()>> + Send;

    /// Hard delete. Membership edges referencing the user are removed
    /// in the same request.
    fn delete(&self, id: Uuid) -> impl Future<Output = AtriumResult<()>> + Send;

    /// Execute a bounded, ordered, filtered query; returns the page
    /// and the total count ignoring pagination.
    fn search(
        &self,
        selection: Selection,
    ) -> impl Future<Output = AtriumResult<(Vec<User>, u64)>> + Send;
}

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: NewTenant) -> impl Future<Output = AtriumResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AtriumResult<Tenant>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = AtriumResult<Tenant>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = AtriumResult<Tenant>> + Send;

    /// Hard delete. Membership edges referencing the tenant are
    /// removed in the same request.
    fn delete(&self, id: Uuid) -> impl Future<Output = AtriumResult<()>> + Send;

    fn search(
        &self,
        selection: Selection,
    ) -> impl Future<Output = AtriumResult<(Vec<Tenant>, u64)>> + Send;
}

/// The user↔tenant membership index. Membership is symmetric data:
/// list operations from either direction read the same edge rows.
pub trait MembershipRepository: Send + Sync {
    /// Fails with `NotFound` if either side does not exist; no-ops if
    /// the pair is already present.
    fn add(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> impl Future<Output = AtriumResult<()>> + Send;

    /// Removes the pair if present; no-ops if absent.
    fn remove(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> impl Future<Output = AtriumResult<()>> + Send;

    fn tenants_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = AtriumResult<Vec<Tenant>>> + Send;

    fn users_for_tenant(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = AtriumResult<Vec<User>>> + Send;

    /// Id-only variants used by the query engine to build scope
    /// predicates without loading full rows.
    fn tenant_ids_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = AtriumResult<Vec<Uuid>>> + Send;

    fn user_ids_for_tenant(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = AtriumResult<Vec<Uuid>>> + Send;
}
