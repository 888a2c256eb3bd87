//! Tickets, booking payloads and receipts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::event::{Category, EventBrief};
use super::user::UserContact;

/// Ticket lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Confirmed,
    Cancelled,
    Used,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Confirmed => "confirmed",
            TicketStatus::Cancelled => "cancelled",
            TicketStatus::Used => "used",
        }
    }

    /// Whether the ticket still holds a seat
    pub fn is_active(&self) -> bool {
        matches!(self, TicketStatus::Pending | TicketStatus::Confirmed)
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TicketStatus::Pending),
            "confirmed" => Ok(TicketStatus::Confirmed),
            "cancelled" => Ok(TicketStatus::Cancelled),
            "used" => Ok(TicketStatus::Used),
            other => Err(format!("Unknown ticket status '{}'", other)),
        }
    }
}

/// How a ticket was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Paypal,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "paypal" => Ok(PaymentMethod::Paypal),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(format!("Unknown payment method '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("Unknown payment status '{}'", other)),
        }
    }
}

/// Stored ticket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub ticket_number: String,
    pub price: f64,
    pub status: TicketStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub qr_code: String,
    pub seat_number: String,
    pub purchase_date: DateTime<Utc>,
}

impl Ticket {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Ticket joined with display fields of its event and, for admins, its owner
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub event: Option<EventBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserContact>,
}

impl TicketView {
    pub fn new(ticket: Ticket, event: Option<EventBrief>) -> Self {
        Self {
            ticket,
            event,
            user: None,
        }
    }

    pub fn with_user(mut self, user: Option<UserContact>) -> Self {
        self.user = user;
        self
    }

    /// Category of the joined event, if the event still exists
    pub fn category(&self) -> Option<Category> {
        self.event.as_ref().map(|event| event.category)
    }
}

/// Body of `POST /api/tickets/book`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookTicketRequest {
    pub event_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub seat_number: Option<String>,
}

/// Payment receipt returned with a booking
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_id: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub ticket: TicketView,
    pub receipt: Receipt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_and_confirmed_are_active() {
        assert!(TicketStatus::Pending.is_active());
        assert!(TicketStatus::Confirmed.is_active());
        assert!(!TicketStatus::Cancelled.is_active());
        assert!(!TicketStatus::Used.is_active());
    }

    #[test]
    fn test_book_request_defaults_and_rejects_unknown_method() {
        let request: BookTicketRequest =
            serde_json::from_str(r#"{"eventId":"abc","seatNumber":"B2"}"#).unwrap();
        assert_eq!(request.payment_method.unwrap_or_default(), PaymentMethod::Card);
        assert_eq!(request.seat_number.as_deref(), Some("B2"));

        let result =
            serde_json::from_str::<BookTicketRequest>(r#"{"eventId":"abc","paymentMethod":"crypto"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_strings_round_trip_through_storage_form() {
        for status in [
            TicketStatus::Pending,
            TicketStatus::Confirmed,
            TicketStatus::Cancelled,
            TicketStatus::Used,
        ] {
            assert_eq!(status.as_str().parse::<TicketStatus>(), Ok(status));
        }
        assert_eq!("paypal".parse::<PaymentMethod>(), Ok(PaymentMethod::Paypal));
        assert_eq!("refunded".parse::<PaymentStatus>(), Ok(PaymentStatus::Refunded));
    }
}
