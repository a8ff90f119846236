//! SurrealDB connection management.
//!
//! Two engines are supported: the remote WebSocket engine for a real
//! deployment and the embedded in-memory engine, which the test
//! suites run against.

use std::env;

use surrealdb::engine::local::{Db, Mem};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::info;

/// Connection settings for the remote engine.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
}

impl DbConfig {
    /// Read connection settings from the `ATRIUM_DB_*` environment
    /// variables. Any variable left unset falls back to the
    /// local-development default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env::var("ATRIUM_DB_URL").unwrap_or(defaults.url),
            namespace: env::var("ATRIUM_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: env::var("ATRIUM_DB_DATABASE").unwrap_or(defaults.database),
            username: env::var("ATRIUM_DB_USERNAME").unwrap_or(defaults.username),
            password: env::var("ATRIUM_DB_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "atrium".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// A connected SurrealDB handle with namespace and database selected,
/// generic over the engine.
pub struct DbManager<C: Connection> {
    db: Surreal<C>,
}

impl DbManager<Client> {
    /// Connect to a remote SurrealDB over WebSocket.
    ///
    /// Authenticates as root, selects the configured namespace and
    /// database, and returns a ready-to-use manager.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db })
    }
}

impl DbManager<Db> {
    /// Open an embedded in-memory instance. Nothing is persisted and
    /// no authentication is involved.
    pub async fn connect_memory(namespace: &str, database: &str) -> Result<Self, surrealdb::Error> {
        let db = Surreal::new::<Mem>(()).await?;
        db.use_ns(namespace).use_db(database).await?;
        Ok(Self { db })
    }
}

impl<C: Connection> DbManager<C> {
    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }
}

impl<C: Connection> Clone for DbManager<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
