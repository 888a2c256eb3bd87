//! Personal dashboard

use auth::Principal;
use axum::{Extension, extract::State, response::IntoResponse};
use chrono::Utc;
use std::collections::HashMap;

use crate::{dashboard::compute_stats, error::ApiResult, response::ApiResponse, state::AppState};

/// Booking statistics for the caller
pub async fn stats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    let mut tickets = state.store.tickets_for_user(principal.id).await?;
    tickets.reverse();

    let event_ids: Vec<_> = tickets.iter().map(|ticket| ticket.event_id).collect();
    let events: HashMap<_, _> = state
        .store
        .find_events(&event_ids)
        .await?
        .into_iter()
        .map(|event| (event.id, event))
        .collect();

    let paired: Vec<_> = tickets
        .into_iter()
        .map(|ticket| {
            let event = events.get(&ticket.event_id).cloned();
            (ticket, event)
        })
        .collect();

    Ok(ApiResponse::data(compute_stats(&paired, Utc::now().date_naive())))
}
