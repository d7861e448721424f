// WebSocket upgrade handler.
// The token rides in the query string because browsers cannot set headers
// on a WebSocket handshake. Upgrade succeeds only for a valid, unrevoked
// JWT and an acceptable (or absent) Origin.

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::cors::origin_matches,
    services::ServiceError,
    utils::ApiError,
    websocket::{serve_ws, ChatProvider, MAX_MESSAGE_SIZE},
};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// GET /ws?token=<jwt>
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> Response {
    // Non-browser clients send no Origin header and are allowed through;
    // browsers must come from a configured origin.
    if let Some(origin) = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()) {
        if !origin_matches(origin, &state.config.ws_allowed_origins) {
            warn!("WebSocket connection denied for origin: {}", origin);
            return StatusCode::FORBIDDEN.into_response();
        }
    }

    let Some(token) = query.token.filter(|token| !token.is_empty()) else {
        return ApiError::Unauthorized("Missing token").into_response();
    };

    let claims = match state.jwt_service.validate_claims_with_blacklist(&token).await {
        Ok(claims) => claims,
        Err(_) => return ApiError::Unauthorized("Token invalid").into_response(),
    };
    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return ApiError::Unauthorized("Token invalid").into_response();
    };

    let hub = state.hub.clone();
    let rate_limiter = Arc::clone(&state.rate_limit_service);
    let provider: Arc<dyn ChatProvider> = Arc::new(state.clone());

    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| {
            serve_ws(socket, hub, provider, rate_limiter, user_id, claims.jti)
        })
}

/// The chat path's view of the domain layer.
#[async_trait::async_trait]
impl ChatProvider for AppState {
    async fn surname_by_id(&self, user_id: Uuid) -> Result<String, ServiceError> {
        self.user_service.surname_by_id(user_id).await
    }

    async fn validate_character_ownership(
        &self,
        character_name: &str,
        user_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let character = self.character_service.get_by_name(character_name).await?;
        Ok(character.user_id == user_id)
    }
}
