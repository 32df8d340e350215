//! Authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::{ApiError, Result};
use crate::models::DbUser;
use crate::services::password::hash_token;
use crate::AppState;

/// Authenticated user stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub user_name: String,
    pub is_superuser: bool,
}

impl AuthenticatedUser {
    pub fn require_superuser(&self) -> Result<()> {
        if self.is_superuser {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "The user doesn't have enough privileges".to_string(),
            ))
        }
    }
}

impl From<&DbUser> for AuthenticatedUser {
    fn from(user: &DbUser) -> Self {
        Self {
            user_id: user.id,
            user_name: user.user_name.clone(),
            is_superuser: user.is_superuser,
        }
    }
}

/// Auth middleware - resolves the bearer token to an active user
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?;

    let user = state
        .db
        .get_user_by_token(&hash_token(token))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

    request.extensions_mut().insert(AuthenticatedUser::from(&user));

    Ok(next.run(request).await)
}
