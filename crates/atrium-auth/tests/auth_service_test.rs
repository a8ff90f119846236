//! Integration tests for the Auth service using in-memory SurrealDB.

use atrium_auth::service::ExternalIdentity;
use atrium_auth::{AuthConfig, AuthService, password};
use atrium_core::error::AtriumError;
use atrium_core::models::user::NewUser;
use atrium_core::repository::{MembershipRepository, TenantRepository, UserRepository};
use atrium_db::{SurrealMembershipRepository, SurrealTenantRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

type TestAuthService = AuthService<
    SurrealUserRepository<Db>,
    SurrealTenantRepository<Db>,
    SurrealMembershipRepository<Db>,
>;

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".into(),
        jwt_issuer: "atrium-test".into(),
        token_lifetime_secs: 3600,
        organization_domain: Some("example.com".into()),
        organization_tenant: "Organization".into(),
        default_tenant: "Default".into(),
    }
}

async fn setup() -> (Surreal<Db>, TestAuthService) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    atrium_db::run_migrations(&db).await.unwrap();

    let service = AuthService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealTenantRepository::new(db.clone()),
        SurrealMembershipRepository::new(db.clone()),
        test_config(),
    );

    (db, service)
}

async fn create_local_user(db: &Surreal<Db>, username: &str, email: &str, plaintext: &str) {
    SurrealUserRepository::new(db.clone())
        .create(NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: password::hash_password(plaintext).unwrap(),
            first_name: None,
            last_name: None,
            role: "user".into(),
            source: "LOCAL".into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn signup_then_login() {
    let (db, service) = setup().await;
    create_local_user(&db, "alice", "alice@example.com", "p@ss1234").await;

    let response = service
        .verify_credentials("alice", "p@ss1234")
        .await
        .unwrap();

    assert!(!response.access_token.is_empty());
    assert_eq!(response.user.username, "alice");
    assert!(response.user.tenants.is_empty());

    let claims = service.validate_token(&response.access_token).unwrap();
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.sub, response.user.id.to_string());

    let wrong = service.verify_credentials("alice", "wrong").await;
    assert!(matches!(
        wrong,
        Err(AtriumError::AuthenticationFailed { .. })
    ));
}

#[tokio::test]
async fn login_by_email_falls_back() {
    let (db, service) = setup().await;
    create_local_user(&db, "bob", "bob@example.com", "hunter2").await;

    let response = service
        .verify_credentials("bob@example.com", "hunter2")
        .await
        .unwrap();
    assert_eq!(response.user.username, "bob");
}

#[tokio::test]
async fn unknown_user_and_wrong_password_are_indistinguishable() {
    let (db, service) = setup().await;
    create_local_user(&db, "carol", "carol@example.com", "right-pass").await;

    let unknown = service
        .verify_credentials("nonexistent-user", "anything")
        .await
        .unwrap_err();
    let mismatch = service
        .verify_credentials("carol", "wrong-password")
        .await
        .unwrap_err();

    assert!(matches!(unknown, AtriumError::AuthenticationFailed { .. }));
    assert!(matches!(mismatch, AtriumError::AuthenticationFailed { .. }));
    assert_eq!(unknown.to_string(), mismatch.to_string());
}

#[tokio::test]
async fn login_profile_includes_tenant_summaries() {
    let (db, service) = setup().await;
    create_local_user(&db, "dave", "dave@example.com", "pw").await;

    let user = SurrealUserRepository::new(db.clone())
        .get_by_username("dave")
        .await
        .unwrap();
    let tenant = SurrealTenantRepository::new(db.clone())
        .create(atrium_core::models::tenant::NewTenant {
            name: "Acme".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    SurrealMembershipRepository::new(db.clone())
        .add(user.id, tenant.id)
        .await
        .unwrap();

    let response = service.verify_credentials("dave", "pw").await.unwrap();
    assert_eq!(response.user.tenants.len(), 1);
    assert_eq!(response.user.tenants[0].id, tenant.id);
    assert_eq!(response.user.tenants[0].name, "Acme");
}

#[tokio::test]
async fn external_login_provisions_user_in_default_tenant() {
    let (db, service) = setup().await;

    let response = service
        .external_login(ExternalIdentity {
            email: "bob@partner.org".into(),
            first_name: Some("Bob".into()),
            last_name: Some("Jones".into()),
            source: "SSO".into(),
        })
        .await
        .unwrap();

    assert!(!response.access_token.is_empty());
    assert_eq!(response.user.email, "bob@partner.org");
    assert_eq!(response.user.tenants.len(), 1);
    assert_eq!(response.user.tenants[0].name, "Default");

    let user = SurrealUserRepository::new(db.clone())
        .get_by_email("bob@partner.org")
        .await
        .unwrap();
    assert_eq!(user.source, "SSO");

    // The placeholder credential is a real digest that never matches.
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert!(!password::verify_password("", &user.password_hash).unwrap());

    // The default tenant was created on demand.
    let tenant = SurrealTenantRepository::new(db)
        .get_by_name("Default")
        .await
        .unwrap();
    assert_eq!(response.user.tenants[0].id, tenant.id);
}

#[tokio::test]
async fn external_login_uses_organization_tenant_for_matching_domain() {
    let (_db, service) = setup().await;

    let response = service
        .external_login(ExternalIdentity {
            email: "carol@EXAMPLE.com".into(),
            first_name: None,
            last_name: None,
            source: "MS".into(),
        })
        .await
        .unwrap();

    assert_eq!(response.user.tenants.len(), 1);
    assert_eq!(response.user.tenants[0].name, "Organization");
}

#[tokio::test]
async fn external_login_is_idempotent_per_email() {
    let (db, service) = setup().await;

    let identity = ExternalIdentity {
        email: "erin@partner.org".into(),
        first_name: Some("Erin".into()),
        last_name: None,
        source: "SSO".into(),
    };

    let first = service.external_login(identity.clone()).await.unwrap();
    let second = service.external_login(identity).await.unwrap();
    assert_eq!(first.user.id, second.user.id);

    // Exactly one user row exists for the email.
    let user = SurrealUserRepository::new(db)
        .get_by_email("erin@partner.org")
        .await
        .unwrap();
    assert_eq!(user.id, first.user.id);
}

#[tokio::test]
async fn token_with_wrong_secret_is_rejected() {
    let (db, service) = setup().await;
    create_local_user(&db, "frank", "frank@example.com", "pw").await;

    let response = service.verify_credentials("frank", "pw").await.unwrap();

    let other = AuthService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealTenantRepository::new(db.clone()),
        SurrealMembershipRepository::new(db),
        AuthConfig {
            jwt_secret: "a-different-secret".into(),
            ..test_config()
        },
    );

    let result = other.validate_token(&response.access_token);
    assert!(matches!(
        result,
        Err(AtriumError::AuthenticationFailed { .. })
    ));
}
