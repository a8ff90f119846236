//! Integration tests for the membership index using in-memory SurrealDB.

use atrium_core::error::AtriumError;
use atrium_core::models::tenant::NewTenant;
use atrium_core::models::user::NewUser;
use atrium_core::repository::{MembershipRepository, TenantRepository, UserRepository};
use atrium_db::{SurrealMembershipRepository, SurrealTenantRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: in-memory DB with one user and one tenant.
async fn setup() -> (Surreal<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    atrium_db::run_migrations(&db).await.unwrap();

    let user = SurrealUserRepository::new(db.clone())
        .create(NewUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$test".into(),
            first_name: None,
            last_name: None,
            role: "user".into(),
            source: "LOCAL".into(),
        })
        .await
        .unwrap();

    let tenant = SurrealTenantRepository::new(db.clone())
        .create(NewTenant {
            name: "Acme".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    (db, user.id, tenant.id)
}

#[tokio::test]
async fn add_and_list_from_both_directions() {
    let (db, user_id, tenant_id) = setup().await;
    let memberships = SurrealMembershipRepository::new(db);

    memberships.add(user_id, tenant_id).await.unwrap();

    let tenants = memberships.tenants_for_user(user_id).await.unwrap();
    assert_eq!(tenants.len(), 1);
    assert_eq!(tenants[0].id, tenant_id);

    let users = memberships.users_for_tenant(tenant_id).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, user_id);
}

#[tokio::test]
async fn add_is_idempotent() {
    let (db, user_id, tenant_id) = setup().await;
    let memberships = SurrealMembershipRepository::new(db);

    memberships.add(user_id, tenant_id).await.unwrap();
    memberships.add(user_id, tenant_id).await.unwrap();

    let tenants = memberships.tenants_for_user(user_id).await.unwrap();
    assert_eq!(tenants.len(), 1, "duplicate add must not create a second edge");
}

#[tokio::test]
async fn add_requires_both_sides() {
    let (db, user_id, tenant_id) = setup().await;
    let memberships = SurrealMembershipRepository::new(db);

    let result = memberships.add(Uuid::new_v4(), tenant_id).await;
    assert!(matches!(result, Err(AtriumError::NotFound { .. })));

    let result = memberships.add(user_id, Uuid::new_v4()).await;
    assert!(matches!(result, Err(AtriumError::NotFound { .. })));
}

#[tokio::test]
async fn remove_is_a_noop_when_absent() {
    let (db, user_id, tenant_id) = setup().await;
    let memberships = SurrealMembershipRepository::new(db);

    memberships.remove(user_id, tenant_id).await.unwrap();

    memberships.add(user_id, tenant_id).await.unwrap();
    memberships.remove(user_id, tenant_id).await.unwrap();
    memberships.remove(user_id, tenant_id).await.unwrap();

    let tenants = memberships.tenants_for_user(user_id).await.unwrap();
    assert!(tenants.is_empty());
}

#[tokio::test]
async fn id_lists_match_full_lists() {
    let (db, user_id, tenant_id) = setup().await;
    let memberships = SurrealMembershipRepository::new(db);

    memberships.add(user_id, tenant_id).await.unwrap();

    let tenant_ids = memberships.tenant_ids_for_user(user_id).await.unwrap();
    assert_eq!(tenant_ids, vec![tenant_id]);

    let user_ids = memberships.user_ids_for_tenant(tenant_id).await.unwrap();
    assert_eq!(user_ids, vec![user_id]);
}

#[tokio::test]
async fn deleting_a_user_cascades_membership() {
    let (db, user_id, tenant_id) = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let memberships = SurrealMembershipRepository::new(db);

    memberships.add(user_id, tenant_id).await.unwrap();
    users.delete(user_id).await.unwrap();

    let members = memberships.users_for_tenant(tenant_id).await.unwrap();
    assert!(members.is_empty());

    let edges = memberships.user_ids_for_tenant(tenant_id).await.unwrap();
    assert!(edges.is_empty(), "no dangling edges after user deletion");
}

#[tokio::test]
async fn deleting_a_tenant_cascades_membership() {
    let (db, user_id, tenant_id) = setup().await;
    let tenants = SurrealTenantRepository::new(db.clone());
    let memberships = SurrealMembershipRepository::new(db);

    memberships.add(user_id, tenant_id).await.unwrap();
    tenants.delete(tenant_id).await.unwrap();

    let mine = memberships.tenants_for_user(user_id).await.unwrap();
    assert!(mine.is_empty());

    let edges = memberships.tenant_ids_for_user(user_id).await.unwrap();
    assert!(edges.is_empty(), "no dangling edges after tenant deletion");
}
