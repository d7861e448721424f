// Area sense handler: what a character can see at its own coordinates.
// The requesting character appears in the listing like anyone else standing
// on the cell.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;

use crate::{
    app::AppState,
    handlers::characters::character_lookup_error,
    middleware::auth::AuthenticatedUser,
    utils::{validate_character_name, ApiError},
};

#[derive(Debug, Serialize)]
pub struct AreaCharacter {
    pub character_name: String,
    pub action_name: String,
    pub action_target: String,
}

#[derive(Debug, Serialize)]
pub struct AreaResponse {
    pub position_x: i32,
    pub position_y: i32,
    pub characters: Vec<AreaCharacter>,
    pub resource_nodes: Vec<String>,
}

/// GET /api/sense/area/{name}
pub async fn sense_area(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<Json<AreaResponse>, ApiError> {
    validate_character_name(&name)?;

    let character = state
        .character_service
        .get_with_ownership_validation(name.trim(), user.user_id)
        .await
        .map_err(character_lookup_error)?;

    let nearby = state
        .character_service
        .get_by_coordinates(character.position_x, character.position_y)
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve characters in area", e))?;

    let mut characters = Vec::with_capacity(nearby.len());
    for other in nearby {
        let action = state
            .catalog_service
            .action_by_id(other.action_id)
            .await
            .map_err(|e| ApiError::internal("Unable to retrieve action name", e))?;

        let action_target = match other.action_target {
            Some(spawn_id) => resolve_target_name(&state, spawn_id).await,
            None => String::new(),
        };

        characters.push(AreaCharacter {
            character_name: other.name,
            action_name: action.name,
            action_target,
        });
    }

    let spawns = state
        .catalog_service
        .spawns_by_coordinates(character.position_x, character.position_y)
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve resource nodes in area", e))?;

    let mut resource_nodes = Vec::with_capacity(spawns.len());
    for spawn in spawns {
        match state.catalog_service.resource_node_by_id(spawn.node_id).await {
            Ok(node) => resource_nodes.push(node.name),
            Err(_) => continue,
        }
    }

    Ok(Json(AreaResponse {
        position_x: character.position_x,
        position_y: character.position_y,
        characters,
        resource_nodes,
    }))
}

async fn resolve_target_name(state: &AppState, spawn_id: i32) -> String {
    let Ok(spawn) = state.catalog_service.spawn_by_id(spawn_id).await else {
        return "Unknown Target".to_string();
    };
    match state.catalog_service.resource_node_by_id(spawn.node_id).await {
        Ok(node) => node.name,
        Err(_) => "Unknown Target".to_string(),
    }
}
