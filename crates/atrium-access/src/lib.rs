//! ATRIUM Access Services — user and tenant operations composing the
//! repositories, the membership index, the query engine, and the
//! password hasher.
//!
//! Services are generic over the repository traits so they carry no
//! dependency on the storage crate.

mod tenant;
mod user;

pub use tenant::{TenantAccess, UpsertTenant};
pub use user::{UpsertUser, UserAccess};
