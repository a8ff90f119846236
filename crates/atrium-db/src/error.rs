//! Database-specific error types and conversions.

use atrium_core::error::AtriumError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Concurrent update: {entity}")]
    ConcurrentUpdate { entity: String },

    #[error("Invalid field name in query: {0}")]
    InvalidField(String),
}

impl DbError {
    /// Translate a statement-level error, mapping unique-index
    /// violations onto the domain conflict variant instead of letting
    /// a raw storage error escape.
    pub(crate) fn constraint(entity: &str, err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        if msg.contains("already contains") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(msg)
        }
    }
}

impl From<DbError> for AtriumError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AtriumError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => AtriumError::AlreadyExists { entity },
            DbError::ConcurrentUpdate { entity } => AtriumError::ConcurrentUpdate { entity },
            DbError::InvalidField(field) => AtriumError::Validation {
                message: format!("invalid field name: {field}"),
            },
            other => AtriumError::Database(other.to_string()),
        }
    }
}
