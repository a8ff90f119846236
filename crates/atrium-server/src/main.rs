//! ATRIUM Server — Application entry point.

use std::env;

use atrium_access::{TenantAccess, UserAccess};
use atrium_auth::{AuthConfig, AuthService};
use atrium_db::{
    DbConfig, DbManager, SurrealMembershipRepository, SurrealTenantRepository,
    SurrealUserRepository, run_migrations,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("atrium=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting ATRIUM server...");

    let db_config = DbConfig::from_env();
    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    let db = manager.client().clone();
    let auth_config = auth_config_from_env();

    let _users = UserAccess::new(
        SurrealUserRepository::new(db.clone()),
        SurrealTenantRepository::new(db.clone()),
        SurrealMembershipRepository::new(db.clone()),
    );
    let _tenants = TenantAccess::new(
        SurrealTenantRepository::new(db.clone()),
        SurrealMembershipRepository::new(db.clone()),
        SurrealUserRepository::new(db.clone()),
    );
    let _auth = AuthService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealTenantRepository::new(db.clone()),
        SurrealMembershipRepository::new(db),
        auth_config,
    );

    tracing::info!("Services initialized");

    // TODO: Start REST API server

    tracing::info!("ATRIUM server stopped.");
}

fn auth_config_from_env() -> AuthConfig {
    let defaults = AuthConfig::default();
    AuthConfig {
        jwt_secret: env::var("ATRIUM_JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!(
                "ATRIUM_JWT_SECRET not set; generated an ephemeral secret, \
                 tokens will not survive a restart"
            );
            ephemeral_secret()
        }),
        jwt_issuer: env::var("ATRIUM_JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
        token_lifetime_secs: env::var("ATRIUM_TOKEN_LIFETIME_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.token_lifetime_secs),
        organization_domain: env::var("ATRIUM_ORG_DOMAIN").ok(),
        organization_tenant: env::var("ATRIUM_ORG_TENANT").unwrap_or(defaults.organization_tenant),
        default_tenant: env::var("ATRIUM_DEFAULT_TENANT").unwrap_or(defaults.default_tenant),
    }
}

/// 32 random bytes, hex-encoded. Only used when no signing secret is
/// configured; every process start gets a fresh one, invalidating any
/// previously issued tokens.
fn ephemeral_secret() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_secret_is_random_and_nonempty() {
        let a = ephemeral_secret();
        let b = ephemeral_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
