// Per-subject fixed-window rate limiting.
// Authenticated requests count against the user id; everything else shares
// the "unauth" bucket at a lower limit.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::middleware::auth::bearer_token;
use crate::services::rate_limit::{
    AUTHENTICATED_PER_MINUTE, UNAUTHENTICATED_PER_MINUTE, UNAUTHENTICATED_SUBJECT,
};
use crate::utils::ApiError;

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // A quick signature check is enough to attribute the request; the
    // blacklist-aware validation still runs in the auth middleware.
    let subject = bearer_token(request.headers())
        .and_then(|token| state.jwt_service.validate_jwt(token).ok());

    let (key, limit) = match subject {
        Some(user_id) => (user_id.to_string(), AUTHENTICATED_PER_MINUTE),
        None => (UNAUTHENTICATED_SUBJECT.to_string(), UNAUTHENTICATED_PER_MINUTE),
    };

    let result = state.rate_limit_service.check(&key, limit).await;
    if !result.allowed {
        return ApiError::RateLimited {
            limit: result.limit,
            window_secs: result.window.as_secs(),
        }
        .into_response();
    }

    next.run(request).await
}
