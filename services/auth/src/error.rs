//! Error type for token and credential handling

use thiserror::Error;

/// Errors raised while issuing or verifying credentials
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token was presented
    #[error("Access token required")]
    MissingToken,

    /// The token is malformed or its signature does not verify
    #[error("Invalid token")]
    InvalidToken,

    /// The token verified but its expiry has passed
    #[error("Token expired")]
    ExpiredToken,

    /// Signing a new token failed
    #[error("Failed to sign token: {0}")]
    Signing(String),

    /// Hashing or parsing a password hash failed
    #[error("Password hashing error: {0}")]
    Hashing(String),

    /// Invalid auth configuration
    #[error("Auth configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with AuthError
pub type AuthResult<T> = Result<T, AuthError>;
