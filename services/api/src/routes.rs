//! API service routes

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::collections::HashMap;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    error::ApiResult,
    middleware::{auth_middleware, error_detail_middleware},
    models::{Event, EventView, Ticket, TicketView},
    repositories::Store,
    state::AppState,
};

mod admin;
mod auth;
mod dashboard;
mod events;
mod system;
mod tickets;

/// Create the router for the API service
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let api = Router::new()
        .route("/health", get(system::health))
        .route("/seed", post(system::seed))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/me",
            get(auth::me).route_layer(require_auth.clone()),
        )
        .route(
            "/auth/profile",
            put(auth::update_profile).route_layer(require_auth.clone()),
        )
        .route(
            "/events",
            get(events::list_events)
                .merge(post(events::create_event).route_layer(require_auth.clone())),
        )
        .route(
            "/events/:id",
            get(events::get_event).merge(
                put(events::update_event)
                    .delete(events::delete_event)
                    .route_layer(require_auth.clone()),
            ),
        )
        .route(
            "/events/organizer/:organizer_id",
            get(events::events_by_organizer),
        )
        .route(
            "/tickets/book",
            post(tickets::book_ticket).route_layer(require_auth.clone()),
        )
        .route(
            "/tickets/my-tickets",
            get(tickets::my_tickets).route_layer(require_auth.clone()),
        )
        .route(
            "/tickets/:ticket_number",
            get(tickets::get_ticket).route_layer(require_auth.clone()),
        )
        .route(
            "/tickets/:ticket_number/cancel",
            post(tickets::cancel_ticket).route_layer(require_auth.clone()),
        )
        .route(
            "/dashboard/stats",
            get(dashboard::stats).route_layer(require_auth.clone()),
        )
        .route(
            "/admin/users",
            get(admin::list_users).route_layer(require_auth.clone()),
        )
        .route(
            "/admin/tickets",
            get(admin::list_tickets).route_layer(require_auth),
        )
        .method_not_allowed_fallback(system::not_found);

    Router::new()
        .nest("/api", api)
        .fallback(system::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error_detail_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn unique_ids(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut unique = Vec::new();
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

/// Attach organizer summaries to a list of events
pub(crate) async fn event_views(
    store: &dyn Store,
    events: Vec<Event>,
) -> ApiResult<Vec<EventView>> {
    let organizer_ids = unique_ids(events.iter().map(|event| event.organizer_id));
    let organizers: HashMap<Uuid, _> = store
        .find_users(&organizer_ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user.organizer_summary()))
        .collect();

    Ok(events
        .into_iter()
        .map(|event| EventView {
            organizer: organizers.get(&event.organizer_id).cloned(),
            event,
            attendee_list: None,
        })
        .collect())
}

/// Join tickets with their events and, optionally, their owners
pub(crate) async fn ticket_views(
    store: &dyn Store,
    tickets: Vec<Ticket>,
    with_owner: bool,
) -> ApiResult<Vec<TicketView>> {
    let event_ids = unique_ids(tickets.iter().map(|ticket| ticket.event_id));
    let events: HashMap<Uuid, _> = store
        .find_events(&event_ids)
        .await?
        .into_iter()
        .map(|event| (event.id, event.brief()))
        .collect();

    let owners: HashMap<Uuid, _> = if with_owner {
        let user_ids = unique_ids(tickets.iter().map(|ticket| ticket.user_id));
        store
            .find_users(&user_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user.contact()))
            .collect()
    } else {
        HashMap::new()
    };

    Ok(tickets
        .into_iter()
        .map(|ticket| {
            let event = events.get(&ticket.event_id).cloned();
            let owner = owners.get(&ticket.user_id).cloned();
            TicketView::new(ticket, event).with_user(owner)
        })
        .collect())
}
