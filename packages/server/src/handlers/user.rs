use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::user::{
    RegisterRequest, TokenRequest, TokenResponse, UpdateMeRequest, UserResponse,
    normalize_email, validate_register_request, validate_token_request, validate_update_me,
};
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/create",
    tag = "User",
    operation_id = "createUser",
    summary = "Register a new user",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let email = normalize_email(&payload.email);

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        email: Set(email),
        name: Set(payload.name.trim().to_string()),
        password: Set(hash),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
        _ => AppError::from(e),
    })?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/token",
    tag = "User",
    operation_id = "createToken",
    summary = "Exchange credentials for a bearer token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong email or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    validate_token_request(&payload)?;

    let email = normalize_email(&payload.email);

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(
        user.id,
        &user.email,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(TokenResponse { token }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "User",
    operation_id = "getMe",
    summary = "Current user's profile",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user, state), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "User",
    operation_id = "updateMe",
    summary = "Update the current user's name or password",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user, state, payload), fields(user_id = auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<Json<UserResponse>, AppError> {
    validate_update_me(&payload)?;

    let existing = find_user(&state.db, auth_user.user_id).await?;
    if payload.name.is_none() && payload.password.is_none() {
        return Ok(Json(existing.into()));
    }

    let mut active: user::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(ref password) = payload.password {
        let hash = hash::hash_password(password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
        active.password = Set(hash);
    }

    let user = active.update(&state.db).await?;
    Ok(Json(user.into()))
}

/// A valid token for a user that no longer exists is treated as invalid.
async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::TokenInvalid)
}
