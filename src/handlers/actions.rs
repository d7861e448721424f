// Action catalog handler.

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::{app::AppState, middleware::auth::AuthenticatedUser, utils::ApiError};

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub id: i32,
    pub name: String,
}

/// GET /api/actions
pub async fn get_actions(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<ActionResponse>>, ApiError> {
    let actions = state
        .catalog_service
        .all_actions()
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve actions", e))?;

    Ok(Json(
        actions
            .into_iter()
            .map(|action| ActionResponse {
                id: action.id,
                name: action.name,
            })
            .collect(),
    ))
}
