//! JWT service for token generation and validation
//!
//! Tokens are signed with HS256 using a shared secret and carry the account
//! id, email, name and role so that downstream authorization never needs a
//! store lookup.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::models::{Principal, Role};

/// Default token lifetime: 7 days
pub const DEFAULT_TOKEN_EXPIRY: u64 = 604_800;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Token expiration time in seconds
    pub token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig, rejecting an empty secret or a zero lifetime
    pub fn new(secret: impl Into<String>, token_expiry: u64) -> AuthResult<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(AuthError::Configuration("JWT secret must not be empty".into()));
        }
        if token_expiry == 0 {
            return Err(AuthError::Configuration(
                "JWT expiry must be at least one second".into(),
            ));
        }

        Ok(JwtConfig {
            secret,
            token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// Display name
    pub name: String,
    /// Account role
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Generate a signed token for a principal
    pub fn generate_token(&self, principal: &Principal) -> AuthResult<String> {
        let now = unix_now()?;
        self.sign(principal, now, now + self.config.token_expiry)
    }

    fn sign(&self, principal: &Principal, iat: u64, exp: u64) -> AuthResult<String> {
        let claims = Claims {
            sub: principal.id,
            email: principal.email.clone(),
            name: principal.name.clone(),
            role: principal.role,
            iat,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                    _ => AuthError::InvalidToken,
                }
            })
    }

    /// Get the token expiry time in seconds
    pub fn token_expiry(&self) -> u64 {
        self.config.token_expiry
    }
}

fn unix_now() -> AuthResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuthError::Signing(format!("Failed to get current time: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "alice@x.com".to_string(),
            name: "Alice".to_string(),
            role: Role::Organizer,
        }
    }

    fn service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig::new(secret, DEFAULT_TOKEN_EXPIRY).unwrap())
    }

    #[test]
    fn test_token_carries_identity() {
        let service = service("test-secret");
        let principal = principal();

        let token = service.generate_token(&principal).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_EXPIRY);
        assert_eq!(Principal::from(claims), principal);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let token = service("secret-a").generate_token(&principal()).unwrap();
        let result = service("secret-b").validate_token(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let service = service("test-secret");
        let now = unix_now().unwrap();
        let token = service.sign(&principal(), now - 7200, now - 3600).unwrap();

        let result = service.validate_token(&token);
        assert!(matches!(result, Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let result = service("test-secret").validate_token("not-a-jwt");
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_config_rejects_empty_secret() {
        assert!(JwtConfig::new("   ", 60).is_err());
        assert!(JwtConfig::new("secret", 0).is_err());
    }
}
