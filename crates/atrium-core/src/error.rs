//! Error types for the ATRIUM system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtriumError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// A read-verify-write cycle lost a compare-and-swap race.
    #[error("Concurrent update detected: {entity}")]
    ConcurrentUpdate { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AtriumResult<T> = Result<T, AtriumError>;
