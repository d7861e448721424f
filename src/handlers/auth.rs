// Session handlers: login, refresh-token rotation and revocation.
//
// Login is also the session-steal point: every refresh token the user holds
// is revoked in the database, every tracked jti is blacklisted, and each
// live WebSocket holding one of those jtis is force-disconnected before the
// response goes out.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    handlers::users::UserResponse,
    middleware::auth::bearer_token,
    models::refresh_token::RefreshToken,
    services::JwtService,
    utils::{verify_password, ApiError, ApiJson},
};

/// Refresh tokens live 60 days unless rotated or revoked first.
const REFRESH_TOKEN_DAYS: i64 = 60;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
    pub refresh_token: String,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .user_service
        .find_by_email(req.email.trim())
        .await
        .map_err(|e| match e {
            crate::services::ServiceError::NotFound(_) => {
                ApiError::Unauthorized("Incorrect email or password")
            }
            e => ApiError::internal("Unable to retrieve user", e),
        })?;

    let password_ok = verify_password(&req.password, &user.hashed_password)
        .map_err(|e| ApiError::internal("Password verification failed", e))?;
    if !password_ok {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    // Revoke every outstanding refresh token. A failure here aborts the
    // login; no new tokens are minted.
    {
        let mut conn = state
            .diesel_pool
            .get()
            .await
            .map_err(|e| ApiError::internal("Login failed", e))?;
        RefreshToken::revoke_all_for_user(&mut conn, user.id)
            .await
            .map_err(|e| ApiError::internal("Login failed", e))?;
    }

    // Blacklist every tracked session token and kick its socket before the
    // response goes out, so no connection survives on a revoked jti.
    let revoked_jtis = state
        .jwt_service
        .blacklist_all_user_tokens(user.id)
        .await
        .map_err(|e| ApiError::internal("Login failed", e))?;
    for jti in &revoked_jtis {
        state.hub.disconnect_client_by_token(jti);
    }

    let (token, jti) = state
        .jwt_service
        .make_jwt(user.id)
        .map_err(|e| ApiError::internal("JWT creation failed", e))?;
    state.jwt_service.track_user_token(user.id, &jti).await;

    let refresh_token = JwtService::make_refresh_token();
    let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_DAYS);
    {
        let mut conn = state
            .diesel_pool
            .get()
            .await
            .map_err(|e| ApiError::internal("Refresh token db insert failed", e))?;
        RefreshToken::store(&mut conn, &refresh_token, user.id, expires_at)
            .await
            .map_err(|e| ApiError::internal("Refresh token db insert failed", e))?;
    }

    Ok(Json(LoginResponse {
        user: UserResponse::from(&user),
        token,
        refresh_token,
    }))
}

/// POST /api/refresh — single-use rotation: the consumed token is revoked
/// and a fresh pair is issued, all-or-nothing.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, ApiError> {
    let presented = bearer_token(&headers)
        .ok_or(ApiError::Unauthorized("Unable to retrieve token"))?
        .to_string();

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve token from database", e))?;

    let record = RefreshToken::find(&mut conn, &presented)
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve token from database", e))?
        .ok_or(ApiError::Unauthorized("Token invalid"))?;

    if !record.is_valid(Utc::now()) {
        return Err(ApiError::Unauthorized("Refresh token has expired"));
    }

    let (token, jti) = state
        .jwt_service
        .make_jwt(record.user_id)
        .map_err(|e| ApiError::internal("JWT creation failed", e))?;

    let new_refresh = JwtService::make_refresh_token();
    let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_DAYS);

    // Rotation is atomic: either the old token is revoked and the new one
    // stored, or the old token stays valid and the client sees 500.
    {
        use diesel_async::AsyncConnection;

        let old_token = record.token.clone();
        let new_token = new_refresh.clone();
        let user_id = record.user_id;

        conn.transaction::<_, diesel::result::Error, _>(|tx| {
            Box::pin(async move {
                RefreshToken::revoke(tx, &old_token).await?;
                RefreshToken::store(tx, &new_token, user_id, expires_at).await?;
                Ok(())
            })
        })
        .await
        .map_err(|e| ApiError::internal("Refresh token rotation failed", e))?;
    }

    state
        .jwt_service
        .track_user_token(record.user_id, &jti)
        .await;

    Ok(Json(RefreshResponse {
        token,
        refresh_token: new_refresh,
    }))
}

/// POST /api/revoke
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let presented = bearer_token(&headers)
        .ok_or(ApiError::Unauthorized("Unable to retrieve token"))?
        .to_string();

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve token from database", e))?;

    let record = RefreshToken::find(&mut conn, &presented)
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve token from database", e))?
        .ok_or(ApiError::Unauthorized("Token invalid"))?;

    RefreshToken::revoke(&mut conn, &record.token)
        .await
        .map_err(|e| ApiError::internal("Unable to update refresh token", e))?;

    Ok(StatusCode::NO_CONTENT)
}
