//! Account roles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried by every account and embedded in issued tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular attendee
    #[default]
    User,
    /// May publish and manage their own events
    Organizer,
    /// Full access
    Admin,
}

impl Role {
    /// Get the role name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Organizer => "organizer",
            Role::Admin => "admin",
        }
    }

    /// Whether this role may publish events
    pub fn can_organize(&self) -> bool {
        matches!(self, Role::Organizer | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "organizer" => Ok(Role::Organizer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}
