//! SurrealDB implementation of [`MembershipRepository`].
//!
//! Membership is a `member_of` graph edge from `user` to `tenant`.
//! The schema's unique (in, out) index keeps the association a set,
//! so a racing duplicate RELATE surfaces as an index violation and is
//! treated as already-a-member.

use atrium_core::error::AtriumResult;
use atrium_core::models::tenant::Tenant;
use atrium_core::models::user::User;
use atrium_core::repository::MembershipRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::CountRow;

/// DB-side row struct for users returned from edge queries.
#[derive(Debug, SurrealValue)]
struct MemberRow {
    record_id: String,
    username: String,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    source: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberRow {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            source: self.source,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct for tenants returned from edge queries.
#[derive(Debug, SurrealValue)]
struct MemberTenantRow {
    record_id: String,
    name: String,
    description: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberTenantRow {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(Tenant {
            id,
            name: self.name,
            description: self.description,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Membership repository.
#[derive(Clone)]
pub struct SurrealMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn add(&self, user_id: Uuid, tenant_id: Uuid) -> AtriumResult<()> {
        let user_id_str = user_id.to_string();
        let tenant_id_str = tenant_id.to_string();

        // Verify both endpoints exist before relating them.
        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE id = type::record('user', $user_id) GROUP ALL; \
                 SELECT count() AS total FROM tenant \
                 WHERE id = type::record('tenant', $tenant_id) GROUP ALL;",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("tenant_id", tenant_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let user_count: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if user_count.first().map(|r| r.total).unwrap_or(0) == 0 {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: user_id_str,
            }
            .into());
        }

        let tenant_count: Vec<CountRow> = check.take(1).map_err(DbError::from)?;
        if tenant_count.first().map(|r| r.total).unwrap_or(0) == 0 {
            return Err(DbError::NotFound {
                entity: "tenant".into(),
                id: tenant_id_str,
            }
            .into());
        }

        // Create the membership edge. RELATE needs literal record ids.
        let query = format!("RELATE user:`{user_id_str}` -> member_of -> tenant:`{tenant_id_str}`");

        let result = self.db.query(query).await.map_err(DbError::from)?;

        // A duplicate pair trips the unique edge index; adding an
        // existing member is a no-op, not an error.
        match result.check() {
            Ok(_) => Ok(()),
            Err(e) => match DbError::constraint("member_of", e) {
                DbError::AlreadyExists { .. } => Ok(()),
                other => Err(other.into()),
            },
        }
    }

    async fn remove(&self, user_id: Uuid, tenant_id: Uuid) -> AtriumResult<()> {
        self.db
            .query(
                "DELETE member_of WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('tenant', $tenant_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn tenants_for_user(&self, user_id: Uuid) -> AtriumResult<Vec<Tenant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE id IN (\
                     SELECT VALUE out FROM member_of \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 ORDER BY name ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberTenantRow> = result.take(0).map_err(DbError::from)?;
        let tenants = rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(tenants)
    }

    async fn users_for_tenant(&self, tenant_id: Uuid) -> AtriumResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE id IN (\
                     SELECT VALUE in FROM member_of \
                     WHERE out = type::record('tenant', $tenant_id)\
                 ) \
                 ORDER BY username ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let users = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(users)
    }

    async fn tenant_ids_for_user(&self, user_id: Uuid) -> AtriumResult<Vec<Uuid>> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE meta::id(out) FROM member_of \
                 WHERE in = type::record('user', $user_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let ids: Vec<String> = result.take(0).map_err(DbError::from)?;
        parse_ids(ids)
    }

    async fn user_ids_for_tenant(&self, tenant_id: Uuid) -> AtriumResult<Vec<Uuid>> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE meta::id(in) FROM member_of \
                 WHERE out = type::record('tenant', $tenant_id)",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let ids: Vec<String> = result.take(0).map_err(DbError::from)?;
        parse_ids(ids)
    }
}

fn parse_ids(raw: Vec<String>) -> AtriumResult<Vec<Uuid>> {
    let ids = raw
        .into_iter()
        .map(|s| Uuid::parse_str(&s).map_err(|e| DbError::Query(format!("invalid UUID: {e}"))))
        .collect::<Result<Vec<_>, DbError>>()?;
    Ok(ids)
}
