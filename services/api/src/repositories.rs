//! Storage traits shared by the in-memory and PostgreSQL stores
//!
//! Handlers only ever see `Arc<dyn Store>`. Booking and cancellation are
//! committed through a single store call each, so every check that guards a
//! write is repeated inside the store's own critical section.

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{Event, EventFilter, Ticket, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of committing a booking
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    /// Ticket stored; carries the event with its new attendee count
    Booked(Event),
    EventNotFound,
    SoldOut,
    /// The user already holds an active ticket for the event
    AlreadyBooked,
    /// Another ticket already uses this ticket number
    TicketNumberTaken,
}

/// Result of committing a cancellation
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// Ticket cancelled and refunded
    Cancelled(Ticket),
    NotFound,
    AlreadyCancelled,
}

/// Full contents written by a reset
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub users: Vec<User>,
    pub events: Vec<Event>,
    pub tickets: Vec<Ticket>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; a taken email is a `DatabaseError::Conflict`
    async fn create_user(&self, user: User) -> DatabaseResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    /// Look up by an already normalised email
    async fn find_user_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_users(&self, ids: &[Uuid]) -> DatabaseResult<Vec<User>>;

    /// Persist name, phone and avatar; returns false when the user is gone
    async fn update_profile(&self, user: &User) -> DatabaseResult<bool>;

    /// All users, newest first
    async fn list_users(&self) -> DatabaseResult<Vec<User>>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create_event(&self, event: Event) -> DatabaseResult<Event>;

    async fn find_event(&self, id: Uuid) -> DatabaseResult<Option<Event>>;

    async fn find_events(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Event>>;

    /// One page of matching events plus the total number of matches
    async fn list_events(&self, filter: &EventFilter) -> DatabaseResult<(Vec<Event>, u64)>;

    /// Persist the editable fields; returns false when the event is gone
    async fn update_event(&self, event: &Event) -> DatabaseResult<bool>;

    async fn delete_event(&self, id: Uuid) -> DatabaseResult<bool>;

    /// Events of one organizer, newest first
    async fn events_by_organizer(&self, organizer_id: Uuid) -> DatabaseResult<Vec<Event>>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_ticket(&self, ticket_number: &str) -> DatabaseResult<Option<Ticket>>;

    async fn find_active_ticket(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Ticket>>;

    /// Tickets of one user, newest purchase first
    async fn tickets_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Ticket>>;

    async fn tickets_for_event(&self, event_id: Uuid) -> DatabaseResult<Vec<Ticket>>;

    /// Every ticket, newest purchase first
    async fn list_tickets(&self) -> DatabaseResult<Vec<Ticket>>;

    /// Atomically store the ticket, take a seat and register the event with
    /// the user, after re-checking capacity and duplicates
    async fn commit_booking(&self, ticket: &Ticket) -> DatabaseResult<BookingOutcome>;

    /// Atomically cancel and refund an active ticket and release its seat
    async fn commit_cancellation(&self, ticket_number: &str) -> DatabaseResult<CancelOutcome>;
}

/// A complete storage backend
#[async_trait]
pub trait Store: UserRepository + EventRepository + TicketRepository {
    /// Short name reported by the health endpoint
    fn backend_name(&self) -> &'static str;

    async fn health_check(&self) -> bool;

    /// Drop every record and write `seed` in its place
    async fn reset(&self, seed: SeedData) -> DatabaseResult<()>;
}
