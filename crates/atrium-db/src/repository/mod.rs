//! SurrealDB repository implementations.

mod membership;
mod tenant;
mod user;

pub use membership::SurrealMembershipRepository;
pub use tenant::SurrealTenantRepository;
pub use user::SurrealUserRepository;

use surrealdb::Connection;
use surrealdb::method::Query;
use surrealdb_types::SurrealValue;

use crate::filter::BindValue;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}

/// Attach compiled selection parameters to a query builder.
pub(crate) fn bind_selection<C: Connection>(
    mut query: Query<'_, C>,
    binds: Vec<(String, BindValue)>,
) -> Query<'_, C> {
    for (name, value) in binds {
        query = match value {
            BindValue::Text(v) => query.bind((name, v)),
            BindValue::Json(v) => query.bind((name, v)),
            BindValue::TextList(v) => query.bind((name, v)),
        };
    }
    query
}
