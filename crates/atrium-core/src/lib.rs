//! ATRIUM Core — domain models, query value objects, repository trait
//! definitions, and the shared error taxonomy.
//!
//! This crate has no persistence or crypto dependencies; the database
//! and auth crates implement the traits defined here.

pub mod error;
pub mod models;
pub mod query;
pub mod repository;

pub use error::{AtriumError, AtriumResult};
