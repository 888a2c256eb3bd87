//! Booking, listing and cancelling tickets

use auth::Principal;
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use super::ticket_views;
use crate::{
    booking,
    error::{ApiError, ApiResult},
    models::{BookTicketRequest, TicketView},
    policy::{self, Action, Resource},
    response::ApiResponse,
    state::AppState,
};

/// Book a seat on an event for the caller
pub async fn book_ticket(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<BookTicketRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let confirmation = booking::book_ticket(&state, &principal, request).await?;

    Ok(ApiResponse::data(confirmation)
        .message("Ticket booked successfully!")
        .created())
}

/// The caller's tickets, newest first
pub async fn my_tickets(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    let tickets = state.store.tickets_for_user(principal.id).await?;
    let views = ticket_views(state.store.as_ref(), tickets, false).await?;
    let count = views.len();

    Ok(ApiResponse::data(views).count(count))
}

/// One ticket, visible to its owner and admins
pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(ticket_number): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let ticket = state
        .store
        .find_ticket(&ticket_number)
        .await?
        .ok_or_else(|| ApiError::not_found("Ticket not found"))?;

    policy::ensure(
        &principal,
        Action::ViewTicket,
        Resource::Ticket {
            owner_id: ticket.user_id,
        },
    )?;

    let view: TicketView = ticket_views(state.store.as_ref(), vec![ticket], true)
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("Ticket view missing"))?;

    Ok(ApiResponse::data(view))
}

/// Cancel one of the caller's tickets
pub async fn cancel_ticket(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(ticket_number): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let ticket = booking::cancel_ticket(&state, &principal, &ticket_number).await?;

    Ok(ApiResponse::data(ticket).message("Ticket cancelled successfully. Refund initiated."))
}
