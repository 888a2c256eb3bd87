//! Health, seeding and the catch-all fallback

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::Method,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    response::ApiResponse,
    seed,
    state::AppState,
};

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let connected = state.store.health_check().await;

    Json(json!({
        "success": true,
        "status": "OK",
        "message": "Eventsphere API is running",
        "mode": state.mode.to_string(),
        "storage": state.store.backend_name(),
        "database": if connected { "Connected" } else { "Disconnected" },
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Replace all data with the sample fixtures
pub async fn seed(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    if !state.seed_enabled {
        return Err(ApiError::forbidden("Seeding is disabled on this server"));
    }

    let summary = seed::run_seed(state.store.as_ref(), &state.passwords, state.is_demo()).await?;
    Ok(ApiResponse::data(summary).message("Database seeded successfully"))
}

/// Fallback for unmatched routes and unsupported methods
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("Route {} {} not found", method, uri.path()))
}
