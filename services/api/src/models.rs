//! API models for request and response payloads

use serde::{Deserialize, Serialize};

pub mod event;
pub mod ticket;
pub mod user;

pub use event::{
    Category, Event, EventBrief, EventFields, EventFilter, EventQuery, EventSort, EventView,
    Location,
};
pub use ticket::{
    BookTicketRequest, BookingConfirmation, PaymentMethod, PaymentStatus, Receipt, Ticket,
    TicketStatus, TicketView,
};
pub use user::{
    AttendeeSummary, CurrentUser, OrganizerSummary, User, UserContact, UserProfile,
};

/// Body of `POST /api/auth/register`
///
/// Fields are optional so a missing one is reported as a validation error
/// instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `PUT /api/auth/profile`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

/// Token and account returned by register and login
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserProfile,
}

/// Per-user booking statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_tickets: usize,
    pub total_spent: f64,
    pub upcoming_events: usize,
    pub past_events: usize,
    pub favorite_category: String,
}

/// Credentials of a seeded account, listed only in demo mode
#[derive(Debug, Clone, Serialize)]
pub struct DemoAccount {
    pub role: &'static str,
    pub email: &'static str,
    pub password: &'static str,
}

/// Record counts written by the seed routine
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub users: usize,
    pub events: usize,
    pub tickets: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_accounts: Option<Vec<DemoAccount>>,
}
