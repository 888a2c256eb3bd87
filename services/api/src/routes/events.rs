//! Event catalog and event management

use auth::Principal;
use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use tracing::info;
use uuid::Uuid;

use super::event_views;
use crate::{
    error::{ApiError, ApiResult},
    models::{AttendeeSummary, EventFields, EventFilter, EventQuery, EventView},
    policy::{self, Action, Resource},
    response::ApiResponse,
    state::AppState,
};

fn event_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::validation("Invalid event ID"))
}

/// List events with filtering, sorting and pagination
pub async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<EventQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let filter = EventFilter::try_from(query).map_err(ApiError::Validation)?;

    let (events, total) = state.store.list_events(&filter).await?;
    let views = event_views(state.store.as_ref(), events).await?;
    let count = views.len();

    Ok(ApiResponse::data(views).count(count).paged(
        total,
        filter.page.page,
        filter.page.total_pages(total),
    ))
}

/// One event with its organizer and current attendees
pub async fn get_event(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = event_id(path)?;
    let event = state
        .store
        .find_event(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    let attendee_ids: Vec<Uuid> = state
        .store
        .tickets_for_event(id)
        .await?
        .into_iter()
        .filter(|ticket| ticket.is_active())
        .map(|ticket| ticket.user_id)
        .collect();
    let users = state.store.find_users(&attendee_ids).await?;
    let attendees: Vec<AttendeeSummary> = attendee_ids
        .iter()
        .filter_map(|id| users.iter().find(|user| user.id == *id))
        .map(|user| user.attendee_summary())
        .collect();

    let organizer = state
        .store
        .find_user_by_id(event.organizer_id)
        .await?
        .map(|user| user.organizer_summary());

    Ok(ApiResponse::data(EventView {
        event,
        organizer,
        attendee_list: Some(attendees),
    }))
}

/// Publish a new event owned by the caller
pub async fn create_event(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<EventFields>, JsonRejection>,
) -> ApiResult<Response> {
    policy::ensure(&principal, Action::CreateEvent, Resource::None)?;
    let Json(fields) = payload?;

    let event = fields
        .into_event(principal.id)
        .map_err(ApiError::Validation)?;
    let event = state.store.create_event(event).await?;
    info!("User {} created event {}", principal.id, event.id);

    let organizer = state
        .store
        .find_user_by_id(principal.id)
        .await?
        .map(|user| user.organizer_summary());

    Ok(ApiResponse::data(EventView {
        event,
        organizer,
        attendee_list: None,
    })
    .message("Event created successfully")
    .created())
}

/// Merge editable fields into an event
pub async fn update_event(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<EventFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = event_id(path)?;
    let Json(fields) = payload?;

    let mut event = state
        .store
        .find_event(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    policy::ensure(
        &principal,
        Action::UpdateEvent,
        Resource::Event {
            organizer_id: event.organizer_id,
        },
    )?;

    fields.apply_to(&mut event).map_err(ApiError::Validation)?;
    if !state.store.update_event(&event).await? {
        return Err(ApiError::not_found("Event not found"));
    }
    info!("User {} updated event {}", principal.id, event.id);

    // Re-read so the attendee count reflects bookings made meanwhile
    let event = state.store.find_event(id).await?.unwrap_or(event);
    let view = event_views(state.store.as_ref(), vec![event])
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("Event view missing"))?;

    Ok(ApiResponse::data(view).message("Event updated successfully"))
}

/// Remove an event
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = event_id(path)?;
    // In-flight bookings commit before the event goes away
    let _guard = state.booking_locks.acquire(id).await;

    let event = state
        .store
        .find_event(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    policy::ensure(
        &principal,
        Action::DeleteEvent,
        Resource::Event {
            organizer_id: event.organizer_id,
        },
    )?;

    if !state.store.delete_event(id).await? {
        return Err(ApiError::not_found("Event not found"));
    }
    info!("User {} deleted event {}", principal.id, id);

    Ok(ApiResponse::ok("Event deleted successfully"))
}

/// All events of one organizer, newest first
pub async fn events_by_organizer(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let organizer_id = path
        .map(|Path(id)| id)
        .map_err(|_| ApiError::validation("Invalid organizer ID"))?;

    let events = state.store.events_by_organizer(organizer_id).await?;
    let views = event_views(state.store.as_ref(), events).await?;
    let count = views.len();

    Ok(ApiResponse::data(views).count(count))
}
