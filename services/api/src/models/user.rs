//! User records and the public views derived from them

use auth::{Principal, Role};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::event::EventBrief;

/// Background colour of generated avatars for self-registered accounts
pub const DEFAULT_AVATAR_BACKGROUND: &str = "6200ee";

/// Stored account
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Always lower-cased
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub avatar: String,
    pub role: Role,
    /// Events the user booked at least once, without duplicates
    pub registered_events: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Identity embedded into issued tokens
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }

    /// Public view without the password hash
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            avatar: self.avatar.clone(),
            registered_events: self.registered_events.clone(),
            created_at: self.created_at,
        }
    }

    pub fn organizer_summary(&self) -> OrganizerSummary {
        OrganizerSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
        }
    }

    pub fn attendee_summary(&self) -> AttendeeSummary {
        AttendeeSummary {
            id: self.id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }

    pub fn contact(&self) -> UserContact {
        UserContact {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    /// Add an event to the registered set; returns false if it was already there
    pub fn register_event(&mut self, event_id: Uuid) -> bool {
        if self.registered_events.contains(&event_id) {
            return false;
        }
        self.registered_events.push(event_id);
        true
    }
}

/// Build a generated avatar URL for a display name
pub fn avatar_url(name: &str, background: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("name", name)
        .append_pair("background", background)
        .append_pair("color", "fff")
        .finish();
    format!("https://ui-avatars.com/api/?{}", query)
}

/// Account as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub avatar: String,
    pub registered_events: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Account of the caller with registered events resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub avatar: String,
    pub registered_events: Vec<EventBrief>,
    pub created_at: DateTime<Utc>,
}

impl CurrentUser {
    pub fn new(user: &User, registered_events: Vec<EventBrief>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            avatar: user.avatar.clone(),
            registered_events,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendeeSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserContact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}
