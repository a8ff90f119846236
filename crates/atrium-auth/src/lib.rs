//! ATRIUM Auth — password hashing, JWT issuance/validation, and the
//! authentication service (credential login plus the external
//! identity-provider bridge).

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthProfile, AuthResponse, AuthService, ExternalIdentity};
pub use token::Claims;
