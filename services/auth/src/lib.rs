//! Authentication building blocks for the Eventsphere API
//!
//! Token issuing and verification (signed JWTs or demo tokens), Argon2
//! password hashing, credential validation and login throttling. Nothing in
//! here knows about HTTP or storage.

pub mod error;
pub mod jwt;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod tokens;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use models::{Principal, Role};
