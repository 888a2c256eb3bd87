//! Registration, login and the caller's own profile

use auth::{
    Principal, Role,
    tokens::TokenPurpose,
    validation::{normalize_email, validate_email, validate_name, validate_password, validate_phone},
};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use common::error::DatabaseError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        AuthPayload, CurrentUser, LoginRequest, RegisterRequest, UpdateProfileRequest, User,
        user::{DEFAULT_AVATAR_BACKGROUND, avatar_url},
    },
    response::ApiResponse,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn required(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn requested_role(role: Option<&str>) -> ApiResult<Role> {
    match role.map(str::trim).filter(|role| !role.is_empty()) {
        None => Ok(Role::User),
        Some(raw) => match raw.to_lowercase().parse::<Role>() {
            Ok(Role::Admin) => Err(ApiError::forbidden(
                "Admin accounts cannot be created through registration",
            )),
            Ok(role) => Ok(role),
            Err(e) => Err(ApiError::Validation(e)),
        },
    }
}

/// Create an account and sign it in
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;

    let (Some(name), Some(email), Some(password)) = (
        required(payload.name),
        required(payload.email),
        required(payload.password),
    ) else {
        return Err(ApiError::validation("Name, email and password are required"));
    };

    let name = name.trim().to_string();
    let email = normalize_email(&email);
    let phone = payload.phone.unwrap_or_default().trim().to_string();

    validate_name(&name).map_err(ApiError::Validation)?;
    validate_email(&email).map_err(ApiError::Validation)?;
    validate_password(&password).map_err(ApiError::Validation)?;
    validate_phone(&phone).map_err(ApiError::Validation)?;
    let role = requested_role(payload.role.as_deref())?;

    let already_exists = || ApiError::Conflict("User already exists with this email".to_string());
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(already_exists());
    }

    let user = User {
        id: Uuid::new_v4(),
        avatar: avatar_url(&name, DEFAULT_AVATAR_BACKGROUND),
        name,
        email,
        password_hash: state.passwords.hash_password(&password).await?,
        phone,
        role,
        registered_events: vec![],
        created_at: Utc::now(),
    };

    let user = state.store.create_user(user).await.map_err(|e| match e {
        DatabaseError::Conflict(_) => already_exists(),
        other => other.into(),
    })?;
    info!("Registered user {} as {}", user.id, user.role);

    let token = state
        .tokens
        .issue(&user.principal(), TokenPurpose::Registration)?;

    Ok(ApiResponse::data(AuthPayload {
        token,
        user: user.profile(),
    })
    .message("Account created successfully!")
    .created())
}

/// Exchange credentials for a token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let (Some(email), Some(password)) = (required(payload.email), required(payload.password))
    else {
        return Err(ApiError::validation("Email and password are required"));
    };
    let email = normalize_email(&email);

    if !state.login_limiter.is_allowed(&email).await {
        warn!("Login throttled for {}", email);
        return Err(ApiError::TooManyRequests(
            "Too many failed login attempts. Please try again later.".to_string(),
        ));
    }

    let user = state.store.find_user_by_email(&email).await?;
    let verified = match &user {
        Some(user) => {
            state
                .passwords
                .verify_password(&user.password_hash, &password)
                .await?
        }
        None => false,
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            state.login_limiter.record_failure(&email).await;
            warn!("Failed login attempt for {}", email);
            return Err(ApiError::Auth(INVALID_CREDENTIALS.to_string()));
        }
    };

    state.login_limiter.reset(&email).await;
    let token = state.tokens.issue(&user.principal(), TokenPurpose::Login)?;
    info!("User {} logged in", user.id);

    Ok(ApiResponse::data(AuthPayload {
        token,
        user: user.profile(),
    })
    .message("Login successful!"))
}

/// The caller's profile with registered events resolved
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .store
        .find_user_by_id(principal.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let events = state.store.find_events(&user.registered_events).await?;
    let registered = user
        .registered_events
        .iter()
        .filter_map(|id| events.iter().find(|event| event.id == *id))
        .map(|event| event.brief())
        .collect();

    Ok(ApiResponse::data(CurrentUser::new(&user, registered)))
}

/// Update name, phone or avatar of the caller
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let mut user = state
        .store
        .find_user_by_id(principal.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if let Some(name) = payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Name cannot be empty"));
        }
        validate_name(name).map_err(ApiError::Validation)?;
        user.name = name.to_string();
    }
    if let Some(phone) = payload.phone {
        let phone = phone.trim();
        validate_phone(phone).map_err(ApiError::Validation)?;
        user.phone = phone.to_string();
    }
    if let Some(avatar) = payload.avatar {
        user.avatar = avatar.trim().to_string();
    }

    if !state.store.update_profile(&user).await? {
        return Err(ApiError::not_found("User not found"));
    }
    info!("Updated profile of user {}", user.id);

    Ok(ApiResponse::data(user.profile()).message("Profile updated successfully"))
}
