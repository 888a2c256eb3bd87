//! Admin-only listings

use auth::Principal;
use axum::{Extension, extract::State, response::IntoResponse};

use super::ticket_views;
use crate::{
    error::ApiResult,
    models::UserProfile,
    policy::{self, Action, Resource},
    response::ApiResponse,
    state::AppState,
};

/// Every account, without credentials
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    policy::ensure(&principal, Action::ListUsers, Resource::None)?;

    let users: Vec<UserProfile> = state
        .store
        .list_users()
        .await?
        .iter()
        .map(|user| user.profile())
        .collect();
    let count = users.len();

    Ok(ApiResponse::data(users).count(count))
}

/// Every ticket with its event and owner
pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    policy::ensure(&principal, Action::ListAllTickets, Resource::None)?;

    let tickets = state.store.list_tickets().await?;
    let views = ticket_views(state.store.as_ref(), tickets, true).await?;
    let count = views.len();

    Ok(ApiResponse::data(views).count(count))
}
