//! In-memory store used in demo mode and by tests
//!
//! All three collections live behind one `RwLock`, so a booking or
//! cancellation commit sees and changes them in a single write section.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    BookingOutcome, CancelOutcome, EventRepository, SeedData, Store, TicketRepository,
    UserRepository,
};
use crate::catalog;
use crate::models::{Event, EventFilter, PaymentStatus, Ticket, TicketStatus, User};

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    events: Vec<Event>,
    tickets: Vec<Ticket>,
}

/// Store keeping every record in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `seed`
    pub fn with_data(seed: SeedData) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collections {
                users: seed.users,
                events: seed.events,
                tickets: seed.tickets,
            })),
        }
    }
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: User) -> DatabaseResult<User> {
        let mut data = self.inner.write().await;
        if data.users.iter().any(|existing| existing.email == user.email) {
            return Err(DatabaseError::Conflict("email"));
        }

        debug!("Storing user {}", user.id);
        data.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|user| user.email == email).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> DatabaseResult<Vec<User>> {
        let data = self.inner.read().await;
        Ok(data
            .users
            .iter()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn update_profile(&self, user: &User) -> DatabaseResult<bool> {
        let mut data = self.inner.write().await;
        match data.users.iter_mut().find(|stored| stored.id == user.id) {
            Some(stored) => {
                stored.name = user.name.clone();
                stored.phone = user.phone.clone();
                stored.avatar = user.avatar.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_users(&self) -> DatabaseResult<Vec<User>> {
        let users = self.inner.read().await.users.clone();
        Ok(newest_first(users, |user| user.created_at))
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn create_event(&self, event: Event) -> DatabaseResult<Event> {
        debug!("Storing event {}", event.id);
        self.inner.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn find_event(&self, id: Uuid) -> DatabaseResult<Option<Event>> {
        let data = self.inner.read().await;
        Ok(data.events.iter().find(|event| event.id == id).cloned())
    }

    async fn find_events(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Event>> {
        let data = self.inner.read().await;
        Ok(data
            .events
            .iter()
            .filter(|event| ids.contains(&event.id))
            .cloned()
            .collect())
    }

    async fn list_events(&self, filter: &EventFilter) -> DatabaseResult<(Vec<Event>, u64)> {
        let events = self.inner.read().await.events.clone();
        Ok(catalog::select(events, filter))
    }

    async fn update_event(&self, event: &Event) -> DatabaseResult<bool> {
        let mut data = self.inner.write().await;
        match data.events.iter_mut().find(|stored| stored.id == event.id) {
            Some(stored) => {
                stored.title = event.title.clone();
                stored.description = event.description.clone();
                stored.date = event.date;
                stored.time = event.time.clone();
                stored.location = event.location.clone();
                stored.category = event.category;
                stored.price = event.price;
                stored.capacity = event.capacity;
                stored.image_url = event.image_url.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_event(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut data = self.inner.write().await;
        let before = data.events.len();
        data.events.retain(|event| event.id != id);
        Ok(data.events.len() < before)
    }

    async fn events_by_organizer(&self, organizer_id: Uuid) -> DatabaseResult<Vec<Event>> {
        let events: Vec<Event> = self
            .inner
            .read()
            .await
            .events
            .iter()
            .filter(|event| event.organizer_id == organizer_id)
            .cloned()
            .collect();
        Ok(newest_first(events, |event| event.created_at))
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn find_ticket(&self, ticket_number: &str) -> DatabaseResult<Option<Ticket>> {
        let data = self.inner.read().await;
        Ok(data
            .tickets
            .iter()
            .find(|ticket| ticket.ticket_number == ticket_number)
            .cloned())
    }

    async fn find_active_ticket(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Ticket>> {
        let data = self.inner.read().await;
        Ok(data
            .tickets
            .iter()
            .find(|t| t.event_id == event_id && t.user_id == user_id && t.is_active())
            .cloned())
    }

    async fn tickets_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Ticket>> {
        let tickets: Vec<Ticket> = self
            .inner
            .read()
            .await
            .tickets
            .iter()
            .filter(|ticket| ticket.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(tickets, |ticket| ticket.purchase_date))
    }

    async fn tickets_for_event(&self, event_id: Uuid) -> DatabaseResult<Vec<Ticket>> {
        let data = self.inner.read().await;
        Ok(data
            .tickets
            .iter()
            .filter(|ticket| ticket.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn list_tickets(&self) -> DatabaseResult<Vec<Ticket>> {
        let tickets = self.inner.read().await.tickets.clone();
        Ok(newest_first(tickets, |ticket| ticket.purchase_date))
    }

    async fn commit_booking(&self, ticket: &Ticket) -> DatabaseResult<BookingOutcome> {
        let mut data = self.inner.write().await;
        let Collections {
            users,
            events,
            tickets,
        } = &mut *data;

        let Some(event) = events.iter_mut().find(|event| event.id == ticket.event_id) else {
            return Ok(BookingOutcome::EventNotFound);
        };
        if event.is_full() {
            return Ok(BookingOutcome::SoldOut);
        }
        if tickets
            .iter()
            .any(|t| t.event_id == ticket.event_id && t.user_id == ticket.user_id && t.is_active())
        {
            return Ok(BookingOutcome::AlreadyBooked);
        }
        if tickets
            .iter()
            .any(|t| t.ticket_number == ticket.ticket_number)
        {
            return Ok(BookingOutcome::TicketNumberTaken);
        }

        event.attendees += 1;
        tickets.push(ticket.clone());
        if let Some(user) = users.iter_mut().find(|user| user.id == ticket.user_id) {
            user.register_event(ticket.event_id);
        }

        debug!(
            "Committed ticket {} for event {} ({}/{})",
            ticket.ticket_number, event.id, event.attendees, event.capacity
        );
        Ok(BookingOutcome::Booked(event.clone()))
    }

    async fn commit_cancellation(&self, ticket_number: &str) -> DatabaseResult<CancelOutcome> {
        let mut data = self.inner.write().await;
        let Collections {
            events, tickets, ..
        } = &mut *data;

        let Some(ticket) = tickets
            .iter_mut()
            .find(|ticket| ticket.ticket_number == ticket_number)
        else {
            return Ok(CancelOutcome::NotFound);
        };
        if !ticket.is_active() {
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        ticket.status = TicketStatus::Cancelled;
        ticket.payment_status = PaymentStatus::Refunded;
        if let Some(event) = events.iter_mut().find(|event| event.id == ticket.event_id) {
            event.attendees = (event.attendees - 1).max(0);
        }

        Ok(CancelOutcome::Cancelled(ticket.clone()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn reset(&self, seed: SeedData) -> DatabaseResult<()> {
        let mut data = self.inner.write().await;
        *data = Collections {
            users: seed.users,
            events: seed.events,
            tickets: seed.tickets,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Location, PaymentMethod};
    use auth::Role;
    use chrono::NaiveDate;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: email.into(),
            password_hash: String::new(),
            phone: String::new(),
            avatar: String::new(),
            role: Role::User,
            registered_events: vec![],
            created_at: Utc::now(),
        }
    }

    fn event(capacity: i32, attendees: i32) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Meetup".into(),
            description: "Monthly meetup".into(),
            date: NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
            time: "18:00".into(),
            location: Location::default(),
            category: Category::Networking,
            price: 10.0,
            capacity,
            attendees,
            image_url: String::new(),
            organizer_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    fn ticket(event: &Event, user: &User, number: &str) -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            event_id: event.id,
            user_id: user.id,
            ticket_number: number.into(),
            price: event.price,
            status: TicketStatus::Confirmed,
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Completed,
            qr_code: String::new(),
            seat_number: "A1".into(),
            purchase_date: Utc::now(),
        }
    }

    fn store(users: Vec<User>, events: Vec<Event>) -> MemoryStore {
        MemoryStore::with_data(SeedData {
            users,
            events,
            tickets: vec![],
        })
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store.create_user(user("a@x.com")).await.unwrap();

        let result = store.create_user(user("a@x.com")).await;
        assert!(matches!(result, Err(DatabaseError::Conflict("email"))));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_booking_commit_takes_a_seat_and_registers_the_event() {
        let alice = user("alice@x.com");
        let meetup = event(2, 0);
        let store = store(vec![alice.clone()], vec![meetup.clone()]);

        let outcome = store
            .commit_booking(&ticket(&meetup, &alice, "TKT-1"))
            .await
            .unwrap();
        let BookingOutcome::Booked(updated) = outcome else {
            panic!("expected booking to succeed, got {:?}", outcome);
        };
        assert_eq!(updated.attendees, 1);

        let stored = store.find_user_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(stored.registered_events, vec![meetup.id]);
        assert!(
            store
                .find_active_ticket(meetup.id, alice.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_booking_commit_rechecks_guards() {
        let alice = user("alice@x.com");
        let bob = user("bob@x.com");
        let meetup = event(1, 0);
        let store = store(vec![alice.clone(), bob.clone()], vec![meetup.clone()]);

        store
            .commit_booking(&ticket(&meetup, &alice, "TKT-1"))
            .await
            .unwrap();

        assert_eq!(
            store
                .commit_booking(&ticket(&meetup, &bob, "TKT-2"))
                .await
                .unwrap(),
            BookingOutcome::SoldOut
        );
        assert_eq!(
            store
                .commit_booking(&ticket(&event(5, 0), &bob, "TKT-3"))
                .await
                .unwrap(),
            BookingOutcome::EventNotFound
        );
    }

    #[tokio::test]
    async fn test_booking_commit_rejects_duplicates() {
        let alice = user("alice@x.com");
        let bob = user("bob@x.com");
        let meetup = event(10, 0);
        let store = store(vec![alice.clone(), bob.clone()], vec![meetup.clone()]);

        store
            .commit_booking(&ticket(&meetup, &alice, "TKT-1"))
            .await
            .unwrap();

        assert_eq!(
            store
                .commit_booking(&ticket(&meetup, &alice, "TKT-2"))
                .await
                .unwrap(),
            BookingOutcome::AlreadyBooked
        );
        assert_eq!(
            store
                .commit_booking(&ticket(&meetup, &bob, "TKT-1"))
                .await
                .unwrap(),
            BookingOutcome::TicketNumberTaken
        );
    }

    #[tokio::test]
    async fn test_cancellation_releases_exactly_one_seat() {
        let alice = user("alice@x.com");
        let meetup = event(10, 0);
        let store = store(vec![alice.clone()], vec![meetup.clone()]);
        store
            .commit_booking(&ticket(&meetup, &alice, "TKT-1"))
            .await
            .unwrap();

        let outcome = store.commit_cancellation("TKT-1").await.unwrap();
        let CancelOutcome::Cancelled(cancelled) = outcome else {
            panic!("expected cancellation, got {:?}", outcome);
        };
        assert_eq!(cancelled.status, TicketStatus::Cancelled);
        assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);

        assert_eq!(
            store.commit_cancellation("TKT-1").await.unwrap(),
            CancelOutcome::AlreadyCancelled
        );
        assert_eq!(
            store.commit_cancellation("TKT-404").await.unwrap(),
            CancelOutcome::NotFound
        );
        let stored = store.find_event(meetup.id).await.unwrap().unwrap();
        assert_eq!(stored.attendees, 0);
    }

    #[tokio::test]
    async fn test_cancellation_never_drops_attendees_below_zero() {
        let alice = user("alice@x.com");
        let meetup = event(10, 0);
        let store = MemoryStore::with_data(SeedData {
            users: vec![alice.clone()],
            events: vec![meetup.clone()],
            tickets: vec![ticket(&meetup, &alice, "TKT-SEEDED")],
        });

        store.commit_cancellation("TKT-SEEDED").await.unwrap();
        let stored = store.find_event(meetup.id).await.unwrap().unwrap();
        assert_eq!(stored.attendees, 0);
    }

    #[tokio::test]
    async fn test_reset_replaces_everything() {
        let store = store(vec![user("a@x.com")], vec![event(1, 0)]);
        store.reset(SeedData::default()).await.unwrap();

        assert!(store.list_users().await.unwrap().is_empty());
        assert_eq!(
            store.list_events(&EventFilter::default()).await.unwrap().1,
            0
        );
    }
}
