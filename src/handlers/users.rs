// User account handlers: signup and credential updates.

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::user::User,
    utils::{hash_password, validate_email, validate_password, validate_surname, ApiError, ApiJson},
};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub surname: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: uuid::Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub surname: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email.clone(),
            surname: user.surname.clone(),
        }
    }
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    validate_surname(&req.surname)?;

    let hashed_password =
        hash_password(&req.password).map_err(|e| ApiError::internal("Password hash failed", e))?;

    let user = state
        .user_service
        .create_user(req.email.trim(), &hashed_password, req.surname.trim())
        .await
        .map_err(|e| ApiError::internal("User creation failed", e))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// PUT /api/users
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let hashed_password =
        hash_password(&req.password).map_err(|e| ApiError::internal("Password hash failed", e))?;

    let updated = state
        .user_service
        .update_credentials(user.user_id, req.email.trim(), &hashed_password)
        .await
        .map_err(|e| ApiError::internal("Database update failed", e))?;

    Ok(Json(UserResponse::from(&updated)))
}
