//! User registration, login and profile endpoints

use axum::{extract::State, Extension, Form, Json};
use chrono::{Duration, Utc};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::password::{generate_token, hash_password, hash_token, verify_password};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;

fn validate_registration(payload: &UserRegisterRequest) -> Result<()> {
    if payload.user_name.trim().is_empty() {
        return Err(ApiError::BadRequest("user_name must not be empty".to_string()));
    }
    validate_email(&payload.email)?;
    validate_password(&payload.password)
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ApiError::BadRequest(format!("invalid email: {}", email))),
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// POST /api/users/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserRegisterRequest>,
) -> Result<Json<UserPublic>> {
    validate_registration(&payload)?;

    let password_hash = hash_password(&payload.password)?;
    let user = state.db.create_user(&payload, &password_hash, false).await?;

    tracing::info!("Registered new user: {}", user.user_name);
    Ok(Json(user.to_public()))
}

/// POST /api/login/access-token
/// Exchanges form-encoded credentials for a bearer token
pub async fn login_access_token(
    State(state): State<AppState>,
    Form(payload): Form<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let user = state
        .db
        .get_user_by_name(&payload.username)
        .await?
        .filter(|user| verify_password(&payload.password, &user.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Incorrect username or password".to_string()))?;

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    let token = generate_token();
    let expires_at = Utc::now() + Duration::minutes(state.config.access_token_expire_minutes);
    state
        .db
        .create_access_token(user.id, &hash_token(&token), expires_at)
        .await?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        expires_at,
    }))
}

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<UserListResponse>> {
    auth.require_superuser()?;

    let users = state.db.list_users().await?;
    Ok(Json(UserListResponse {
        users: users.iter().map(DbUser::to_public).collect(),
    }))
}

/// GET /api/users/me
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<UserPublic>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.to_public()))
}

/// PUT /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<UserUpdateRequest>,
) -> Result<Json<UserPublic>> {
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }
    let password_hash = match &payload.password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = state
        .db
        .update_user(
            auth.user_id,
            payload.email.as_deref(),
            payload.full_name.as_deref(),
            password_hash.as_deref(),
        )
        .await?;

    Ok(Json(user.to_public()))
}

/// DELETE /api/users/me
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<MessageResponse>> {
    if auth.is_superuser {
        return Err(ApiError::Forbidden(
            "Super users are not allowed to delete themselves".to_string(),
        ));
    }

    state.db.delete_user(auth.user_id).await?;
    tracing::info!("Deleted user: {}", auth.user_name);

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
