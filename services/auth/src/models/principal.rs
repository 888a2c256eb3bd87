//! Authenticated identity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// The identity a verified bearer token resolves to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Principal {
    /// Whether the principal holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
