//! Token issuing and verification for both run modes
//!
//! Database mode signs real JWTs. Demo mode hands out opaque `demo-` strings
//! and resolves every one of them to the same fixed attendee identity; it
//! performs no verification at all and exists for local demos only.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::jwt::JwtService;
use crate::models::{Principal, Role};

/// Prefix every demo token starts with
pub const DEMO_TOKEN_PREFIX: &str = "demo-";

/// Fixed id of the demo attendee, shared with the seeded fixture account
pub const DEMO_USER_ID: Uuid = Uuid::from_u128(0x6576_656e_7473_7068_6572_6500_0000_0001);

/// Email of the demo attendee
pub const DEMO_USER_EMAIL: &str = "john@eventsphere.com";

/// Display name of the demo attendee
pub const DEMO_USER_NAME: &str = "John Attendee";

/// Why a token is being issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Login,
    Registration,
}

/// Issues and verifies bearer tokens
#[derive(Clone)]
pub enum TokenAuthority {
    /// Signed, expiring JWTs
    Signed(JwtService),
    /// Unverified `demo-` tokens
    Demo,
}

impl TokenAuthority {
    /// Issue a token for a principal
    pub fn issue(&self, principal: &Principal, purpose: TokenPurpose) -> AuthResult<String> {
        match self {
            TokenAuthority::Signed(jwt) => jwt.generate_token(principal),
            TokenAuthority::Demo => {
                let kind = match purpose {
                    TokenPurpose::Login => "token",
                    TokenPurpose::Registration => "register",
                };
                Ok(format!(
                    "{}{}-{}",
                    DEMO_TOKEN_PREFIX,
                    kind,
                    Utc::now().timestamp_millis()
                ))
            }
        }
    }

    /// Verify a bearer token and resolve the principal it stands for
    pub fn verify(&self, token: &str) -> AuthResult<Principal> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        match self {
            TokenAuthority::Signed(jwt) => jwt.validate_token(token).map(Principal::from),
            TokenAuthority::Demo if token.starts_with(DEMO_TOKEN_PREFIX) => Ok(demo_principal()),
            TokenAuthority::Demo => Err(AuthError::InvalidToken),
        }
    }

    /// Whether this authority hands out demo tokens
    pub fn is_demo(&self) -> bool {
        matches!(self, TokenAuthority::Demo)
    }
}

/// The identity every demo token maps to
pub fn demo_principal() -> Principal {
    Principal {
        id: DEMO_USER_ID,
        email: DEMO_USER_EMAIL.to_string(),
        name: DEMO_USER_NAME.to_string(),
        role: Role::User,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{DEFAULT_TOKEN_EXPIRY, JwtConfig};

    fn organizer() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "organizer@eventsphere.com".to_string(),
            name: "Event Organizer".to_string(),
            role: Role::Organizer,
        }
    }

    #[test]
    fn test_demo_tokens_resolve_to_fixed_identity() {
        let authority = TokenAuthority::Demo;

        let login = authority.issue(&organizer(), TokenPurpose::Login).unwrap();
        let register = authority
            .issue(&organizer(), TokenPurpose::Registration)
            .unwrap();
        assert!(login.starts_with("demo-token-"));
        assert!(register.starts_with("demo-register-"));

        assert_eq!(authority.verify(&login).unwrap(), demo_principal());
        assert_eq!(authority.verify("demo-anything").unwrap().id, DEMO_USER_ID);
    }

    #[test]
    fn test_demo_authority_rejects_other_tokens() {
        let authority = TokenAuthority::Demo;
        assert!(matches!(
            authority.verify("Bearer-xyz"),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(authority.verify("  "), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_signed_authority_rejects_demo_tokens() {
        let jwt = JwtService::new(JwtConfig::new("secret", DEFAULT_TOKEN_EXPIRY).unwrap());
        let authority = TokenAuthority::Signed(jwt);
        let principal = organizer();

        let token = authority.issue(&principal, TokenPurpose::Login).unwrap();
        assert_eq!(authority.verify(&token).unwrap(), principal);
        assert!(authority.verify("demo-token-1").is_err());
    }
}
