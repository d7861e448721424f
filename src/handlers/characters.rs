// Character handlers: creation, action updates and the ownership-checked
// select echo.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::catalog::{ResourceNode, ResourceNodeSpawn},
    models::character::Character,
    services::ServiceError,
    utils::{
        validate_amount, validate_character_name, validate_target, ApiError, ApiJson,
    },
};

#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCharacterRequest {
    pub character_name: String,
    pub target: String,
    pub amount: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CharacterResponse {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub name: String,
    pub position_x: i32,
    pub position_y: i32,
    pub action_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Character> for CharacterResponse {
    fn from(character: &Character) -> Self {
        Self {
            id: character.id,
            user_id: character.user_id,
            name: character.name.clone(),
            position_x: character.position_x,
            position_y: character.position_y,
            action_id: character.action_id,
            created_at: character.created_at,
            updated_at: character.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateCharacterResponse {
    pub character_name: String,
    pub action_name: String,
    pub target: String,
}

/// Translate a character-resolution failure into its API shape.
pub(crate) fn character_lookup_error(err: ServiceError) -> ApiError {
    match err {
        ServiceError::NotOwned => ApiError::Unauthorized("Character doesn't belong to user"),
        ServiceError::NotFound(_) => ApiError::NotFound("Character not found"),
        e => ApiError::internal("Unable to retrieve character", e),
    }
}

/// POST /api/characters
pub async fn create_character(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<CreateCharacterRequest>,
) -> Result<(StatusCode, Json<CharacterResponse>), ApiError> {
    validate_character_name(&req.name)?;

    let (character, _inventory) = state
        .character_service
        .create_character(user.user_id, req.name.trim())
        .await
        .map_err(|e| ApiError::internal("Character creation failed", e))?;

    Ok((StatusCode::CREATED, Json(CharacterResponse::from(&character))))
}

/// PUT /api/characters — redirect a character at a target (or IDLE), with
/// tool gating and an optional gathering amount limit.
pub async fn update_character(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<UpdateCharacterRequest>,
) -> Result<(StatusCode, Json<UpdateCharacterResponse>), ApiError> {
    validate_character_name(&req.character_name)?;
    validate_target(&req.target)?;
    validate_amount(req.amount)?;

    let character = state
        .character_service
        .get_with_ownership_validation(req.character_name.trim(), user.user_id)
        .await
        .map_err(character_lookup_error)?;

    let target = req.target.trim();
    let (action, spawn_and_node) = if target == "IDLE" {
        let action = state
            .catalog_service
            .idle_action()
            .await
            .map_err(|e| ApiError::internal("Unable to retrieve action", e))?;
        (action, None)
    } else {
        let (spawn, node) =
            find_spawn_at(&state, character.position_x, character.position_y, target).await?;
        let action = state
            .catalog_service
            .action_by_id(node.action_id)
            .await
            .map_err(|e| ApiError::internal("Unable to retrieve action", e))?;
        (action, Some((spawn, node)))
    };

    // Tool gate: the action may demand a tool type at the node's minimum tier
    if let (Some(required_tool_type), Some((_, node))) =
        (action.required_tool_type_id, spawn_and_node.as_ref())
    {
        let best = state
            .inventory_service
            .get_best_tool_for_type(character.id, required_tool_type, node.min_tool_tier)
            .await
            .map_err(|e| ApiError::internal("Unable to check inventory for tools", e))?;

        if best.is_none() {
            let tool_type = state
                .catalog_service
                .tool_type_by_id(required_tool_type)
                .await
                .map_err(|e| ApiError::internal("Unable to retrieve tool type", e))?;
            return Err(ApiError::Validation(format!(
                "{} requires a {} of tier {} or higher",
                action.name, tool_type.name, node.min_tool_tier
            )));
        }
    }

    let action_target = spawn_and_node.as_ref().map(|(spawn, _)| spawn.id);
    let amount_limit = req.amount.filter(|amount| *amount > 0);

    state
        .character_service
        .update_character_action(&character, action.id, action_target, amount_limit)
        .await
        .map_err(|e| ApiError::internal("Character update failed", e))?;

    Ok((
        StatusCode::CREATED,
        Json(UpdateCharacterResponse {
            character_name: character.name,
            action_name: action.name,
            target: target.to_string(),
        }),
    ))
}

/// Case-insensitively locate the spawn at the character's coordinates whose
/// node name equals the requested target.
async fn find_spawn_at(
    state: &AppState,
    x: i32,
    y: i32,
    target: &str,
) -> Result<(ResourceNodeSpawn, ResourceNode), ApiError> {
    let spawns = state
        .catalog_service
        .spawns_by_coordinates(x, y)
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve resource nodes", e))?;

    for spawn in spawns {
        let node = state
            .catalog_service
            .resource_node_by_id(spawn.node_id)
            .await
            .map_err(|e| ApiError::internal("Unable to retrieve resource node", e))?;

        if node.name.eq_ignore_ascii_case(target) {
            return Ok((spawn, node));
        }
    }

    Err(ApiError::Validation(
        "Target not found at character location".to_string(),
    ))
}

/// GET /api/characters/{name}/select
pub async fn select_character(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<Json<CharacterResponse>, ApiError> {
    validate_character_name(&name)?;

    let character = state
        .character_service
        .get_with_ownership_validation(name.trim(), user.user_id)
        .await
        .map_err(character_lookup_error)?;

    Ok(Json(CharacterResponse::from(&character)))
}
