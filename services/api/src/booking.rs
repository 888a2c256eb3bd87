//! Ticket booking and cancellation
//!
//! Both run inside a per-event critical section: concurrent requests for the
//! same event queue on an async mutex, while requests for different events
//! proceed in parallel. The store commit re-checks every guard as well.

use auth::Principal;
use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    BookTicketRequest, BookingConfirmation, Event, PaymentStatus, Receipt, Ticket, TicketStatus,
    TicketView,
};
use crate::payment::{ChargeOutcome, ChargeRequest};
use crate::policy::{self, Action, Resource};
use crate::repositories::{BookingOutcome, CancelOutcome};
use crate::state::AppState;

/// How often a colliding ticket number is regenerated before giving up
const MAX_TICKET_NUMBER_ATTEMPTS: usize = 5;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// One async mutex per event id
#[derive(Clone, Default)]
pub struct EventLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl EventLocks {
    /// Wait for exclusive access to one event
    pub async fn acquire(&self, event_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop locks nobody holds or waits on
            locks.retain(|id, lock| *id == event_id || Arc::strong_count(lock) > 1);
            locks.entry(event_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

fn base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// `TKT-<base36 millis>-<4 random base36 chars>`, upper-case
pub fn generate_ticket_number() -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("TKT-{}-{}", base36(millis), suffix)
}

/// QR image URL encoding the event, ticket number, date and venue
pub fn qr_code_url(event: &Event, ticket_number: &str) -> String {
    let text = format!(
        "Event: {}\nTicket: {}\nDate: {}\nVenue: {}",
        event.title, ticket_number, event.date, event.location.venue
    );
    let data: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
    format!(
        "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data={}",
        data
    )
}

/// Random seat in row A
pub fn default_seat() -> String {
    format!("A{}", rand::thread_rng().gen_range(1..=50))
}

fn parse_event_id(raw: Option<&str>) -> ApiResult<Uuid> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| ApiError::validation("Event ID is required"))?;
    Uuid::parse_str(raw).map_err(|_| ApiError::validation("Invalid event ID"))
}

fn sold_out() -> ApiError {
    ApiError::Capacity("Event is full. No tickets available.".to_string())
}

fn already_booked() -> ApiError {
    ApiError::Conflict("You have already booked a ticket for this event".to_string())
}

/// Book a seat for the caller, charging the configured gateway
pub async fn book_ticket(
    state: &AppState,
    principal: &Principal,
    request: BookTicketRequest,
) -> ApiResult<BookingConfirmation> {
    let event_id = parse_event_id(request.event_id.as_deref())?;
    let _guard = state.booking_locks.acquire(event_id).await;

    let event = state
        .store
        .find_event(event_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    if event.is_full() {
        return Err(sold_out());
    }

    if state
        .store
        .find_active_ticket(event_id, principal.id)
        .await?
        .is_some()
    {
        return Err(already_booked());
    }

    let payment_method = request.payment_method.unwrap_or_default();
    let charge = ChargeRequest {
        amount: event.price,
        method: payment_method,
    };
    let transaction_id = match state.payments.charge(&charge).await {
        ChargeOutcome::Approved { transaction_id } => transaction_id,
        ChargeOutcome::Declined { reason } => {
            warn!(
                "Payment declined for user {} on event {}: {}",
                principal.id, event_id, reason
            );
            return Err(ApiError::Payment(
                "Payment failed. Please try again or use a different payment method."
                    .to_string(),
            ));
        }
    };

    let seat_number = request
        .seat_number
        .map(|seat| seat.trim().to_string())
        .filter(|seat| !seat.is_empty())
        .unwrap_or_else(default_seat);

    let mut ticket = Ticket {
        id: Uuid::new_v4(),
        event_id,
        user_id: principal.id,
        ticket_number: String::new(),
        price: event.price,
        status: TicketStatus::Confirmed,
        payment_method,
        payment_status: PaymentStatus::Completed,
        qr_code: String::new(),
        seat_number,
        purchase_date: Utc::now(),
    };

    let mut booked = None;
    for _ in 0..MAX_TICKET_NUMBER_ATTEMPTS {
        ticket.ticket_number = generate_ticket_number();
        ticket.qr_code = qr_code_url(&event, &ticket.ticket_number);

        match state.store.commit_booking(&ticket).await? {
            BookingOutcome::Booked(updated) => {
                booked = Some(updated);
                break;
            }
            BookingOutcome::TicketNumberTaken => continue,
            BookingOutcome::EventNotFound => return Err(ApiError::not_found("Event not found")),
            BookingOutcome::SoldOut => return Err(sold_out()),
            BookingOutcome::AlreadyBooked => return Err(already_booked()),
        }
    }
    let event = booked.ok_or_else(|| {
        warn!(
            "Charged transaction {} could not be committed for event {}",
            transaction_id, event_id
        );
        ApiError::internal("Could not allocate a unique ticket number")
    })?;

    info!(
        "Booked ticket {} for user {} on event {} ({}/{})",
        ticket.ticket_number, principal.id, event.id, event.attendees, event.capacity
    );

    let owner = state
        .store
        .find_user_by_id(principal.id)
        .await?
        .map(|user| user.contact());
    let receipt = Receipt {
        transaction_id,
        amount: event.price,
        payment_method,
        status: PaymentStatus::Completed,
        date: Utc::now(),
    };

    Ok(BookingConfirmation {
        ticket: TicketView::new(ticket, Some(event.brief())).with_user(owner),
        receipt,
    })
}

/// Cancel and refund one of the caller's tickets, releasing its seat
pub async fn cancel_ticket(
    state: &AppState,
    principal: &Principal,
    ticket_number: &str,
) -> ApiResult<Ticket> {
    let ticket = state
        .store
        .find_ticket(ticket_number)
        .await?
        .ok_or_else(|| ApiError::not_found("Ticket not found"))?;

    policy::ensure(
        principal,
        Action::CancelTicket,
        Resource::Ticket {
            owner_id: ticket.user_id,
        },
    )?;

    if !ticket.is_active() {
        return Err(ApiError::Conflict(
            "Ticket has already been cancelled".to_string(),
        ));
    }

    let _guard = state.booking_locks.acquire(ticket.event_id).await;

    let today = Utc::now().date_naive();
    if let Some(event) = state.store.find_event(ticket.event_id).await? {
        if event.has_started(today) {
            return Err(ApiError::PastEvent(
                "Cannot cancel ticket for past events".to_string(),
            ));
        }
    }

    match state.store.commit_cancellation(ticket_number).await? {
        CancelOutcome::Cancelled(cancelled) => {
            info!(
                "Cancelled ticket {} on event {}",
                cancelled.ticket_number, cancelled.event_id
            );
            Ok(cancelled)
        }
        CancelOutcome::NotFound => Err(ApiError::not_found("Ticket not found")),
        CancelOutcome::AlreadyCancelled => Err(ApiError::Conflict(
            "Ticket has already been cancelled".to_string(),
        )),
    }
}
