//! JWT session token issuance and verification.
//!
//! Tokens are HS256-signed and carry exactly the user identity the
//! rest of the system needs: the user id (`sub`) and username.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    pub username: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Issue a signed session token for the given user.
pub fn issue(user_id: Uuid, username: &str, config: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + config.token_lifetime_secs as i64,
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify a session token (signature, expiry, issuer).
pub fn decode(token: &str, config: &AuthConfig) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-not-for-production".into(),
            jwt_issuer: "atrium-test".into(),
            token_lifetime_secs: 3600,
            ..Default::default()
        }
    }

    #[test]
    fn token_roundtrip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = issue(user_id, "alice", &config).unwrap();
        let claims = decode(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.iss, "atrium-test");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = issue(Uuid::new_v4(), "alice", &config).unwrap();

        let other = AuthConfig {
            jwt_secret: "a-different-secret".into(),
            ..test_config()
        };
        assert!(matches!(
            decode(&token, &other),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let config = test_config();
        let token = issue(Uuid::new_v4(), "alice", &config).unwrap();

        let other = AuthConfig {
            jwt_issuer: "someone-else".into(),
            ..test_config()
        };
        assert!(decode(&token, &other).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = test_config();
        let mut token = issue(Uuid::new_v4(), "alice", &config).unwrap();
        token.push('x');
        assert!(decode(&token, &config).is_err());
    }
}
