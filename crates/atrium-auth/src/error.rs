//! Authentication error types.

use atrium_core::error::AtriumError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately covers both "no such user" and "wrong password"
    /// so that callers cannot distinguish the two.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for AtriumError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => AtriumError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => AtriumError::Crypto(msg),
        }
    }
}
