//! Custom error types for the API service
//!
//! Every failure leaves a handler as an [`ApiError`] and is rendered into the
//! common envelope with an HTTP status and a machine-readable code.

use auth::AuthError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use thiserror::Error;
use tracing::error;

use crate::response::ApiResponse;

/// Underlying text of a 500, carried on the response so the error detail
/// middleware can reveal it outside production
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The event has no seats left
    #[error("{0}")]
    Capacity(String),

    /// The payment gateway declined the charge
    #[error("{0}")]
    Payment(String),

    /// The event already took place
    #[error("{0}")]
    PastEvent(String),

    /// Login throttling kicked in
    #[error("{0}")]
    TooManyRequests(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Conflict(_)
            | ApiError::Capacity(_)
            | ApiError::Payment(_)
            | ApiError::PastEvent(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Auth(_) => "AUTH_ERROR",
            ApiError::Forbidden(_) => "FORBIDDEN_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND_ERROR",
            ApiError::Conflict(_) => "CONFLICT_ERROR",
            ApiError::Capacity(_) => "CAPACITY_ERROR",
            ApiError::Payment(_) => "PAYMENT_ERROR",
            ApiError::PastEvent(_) => "PAST_EVENT_ERROR",
            ApiError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            ApiError::Internal(_) | ApiError::Database(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Conflict(field) => {
                ApiError::Conflict(format!("A record with this {} already exists", field))
            }
            other => ApiError::Database(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingToken => {
                ApiError::Auth("Access token required. Please login first.".to_string())
            }
            AuthError::InvalidToken | AuthError::ExpiredToken => {
                ApiError::Auth("Invalid or expired token. Please login again.".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
            let body =
                ApiResponse::failure("Internal server error", Some(self.code().to_string()));
            let mut response = (status, body).into_response();
            response
                .extensions_mut()
                .insert(InternalErrorDetail(self.to_string()));
            return response;
        }

        let body = ApiResponse::failure(self.to_string(), Some(self.code().to_string()));
        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
