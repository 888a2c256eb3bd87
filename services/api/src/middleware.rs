//! Bearer authentication and CORS

use auth::AuthError;
use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};

use crate::{
    error::{ApiError, InternalErrorDetail},
    response::ApiResponse,
    state::AppState,
};

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

/// Authentication middleware
///
/// Resolves the bearer token through the configured token authority and
/// stores the resulting `Principal` in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::MissingToken)?;

    let principal = state.tokens.verify(bearer.token()).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        e
    })?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Reveal the underlying text of 500 responses when the service allows it
pub async fn error_detail_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    if !state.expose_error_details {
        return response;
    }

    let detail = response
        .extensions()
        .get::<InternalErrorDetail>()
        .map(|InternalErrorDetail(detail)| detail.clone());
    match detail {
        Some(detail) => (
            response.status(),
            ApiResponse::failure("Internal server error", Some(detail)),
        )
            .into_response(),
        None => response,
    }
}

/// Build the CORS layer; `None` allows any origin
pub fn cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(Duration::from_secs(PREFLIGHT_MAX_AGE_SECS));

    let origins: Vec<HeaderValue> = origins
        .unwrap_or_default()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(AllowOrigin::any())
    } else {
        debug!("CORS: Configured with {} allowed origin(s)", origins.len());
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::ApprovingGateway;
    use crate::repositories::MemoryStore;
    use auth::password::{PasswordConfig, PasswordService};
    use auth::tokens::TokenAuthority;
    use axum::{Router, body::Body, body::to_bytes, middleware, routing::get};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn failing_route(expose: bool) -> Value {
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            TokenAuthority::Demo,
            PasswordService::new(PasswordConfig::low_cost()).unwrap(),
            Arc::new(ApprovingGateway::new()),
        )
        .with_error_details(expose);

        let app = Router::new()
            .route("/boom", get(|| async { ApiError::internal("disk full") }))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                error_detail_middleware,
            ))
            .with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_detail_shown_when_allowed() {
        let body = failing_route(true).await;
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["error"], "disk full");
    }

    #[tokio::test]
    async fn test_error_detail_hidden_in_production() {
        let body = failing_route(false).await;
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["error"], "INTERNAL_ERROR");
    }
}
