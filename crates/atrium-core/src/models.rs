//! Domain models and DTO projections.

pub mod tenant;
pub mod user;
