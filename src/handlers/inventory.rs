// Inventory handlers: the item listing and the drop endpoint.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    handlers::characters::character_lookup_error,
    middleware::auth::AuthenticatedUser,
    services::ServiceError,
    utils::{
        validate_character_name, validate_item_name, validate_quantity, ApiError, ApiJson,
    },
};

#[derive(Debug, Serialize)]
pub struct InventoryItemResponse {
    pub name: String,
    pub quantity: i32,
    pub weight: i32,
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub items: Vec<InventoryItemResponse>,
    pub weight: i32,
    pub capacity: i32,
}

#[derive(Debug, Deserialize)]
pub struct DropItemRequest {
    pub character_name: String,
    pub item_name: String,
    pub quantity: Option<i32>,
    #[serde(default)]
    pub drop_all: bool,
}

#[derive(Debug, Serialize)]
pub struct DropItemResponse {
    pub item_name: String,
    pub dropped: i32,
}

/// GET /api/inventory/{name}
pub async fn get_inventory(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<Json<InventoryResponse>, ApiError> {
    validate_character_name(&name)?;

    let character = state
        .character_service
        .get_with_ownership_validation(name.trim(), user.user_id)
        .await
        .map_err(character_lookup_error)?;

    let inventory = state
        .inventory_service
        .get_inventory_by_character_id(character.id)
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve inventory", e))?;

    let rows = state
        .inventory_service
        .get_inventory_items(inventory.id)
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve inventory items", e))?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let item = state
            .catalog_service
            .item_by_id(row.item_id)
            .await
            .map_err(|e| ApiError::internal("Unable to retrieve item", e))?;
        items.push(InventoryItemResponse {
            name: item.name,
            quantity: row.quantity,
            weight: item.weight,
        });
    }

    Ok(Json(InventoryResponse {
        items,
        weight: inventory.weight,
        capacity: inventory.capacity,
    }))
}

/// POST /api/inventory/drop — drop N of an item, or the whole stack.
pub async fn drop_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<DropItemRequest>,
) -> Result<Json<DropItemResponse>, ApiError> {
    validate_character_name(&req.character_name)?;
    validate_item_name(req.item_name.trim())?;

    if !req.drop_all {
        let quantity = req
            .quantity
            .ok_or_else(|| ApiError::Validation("quantity must be greater than 0".to_string()))?;
        validate_quantity(quantity)?;
    }

    let character = state
        .character_service
        .get_with_ownership_validation(req.character_name.trim(), user.user_id)
        .await
        .map_err(character_lookup_error)?;

    let item = state
        .catalog_service
        .item_by_name(req.item_name.trim())
        .await
        .map_err(|e| match e {
            ServiceError::NotFound(_) => ApiError::NotFound("Item not found"),
            e => ApiError::internal("Unable to retrieve item", e),
        })?;

    let inventory = state
        .inventory_service
        .get_inventory_by_character_id(character.id)
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve inventory", e))?;

    let held = state
        .inventory_service
        .get_item_quantity(inventory.id, item.id)
        .await
        .map_err(|e| ApiError::internal("Unable to retrieve inventory items", e))?;

    let quantity = if req.drop_all {
        held
    } else {
        req.quantity.unwrap_or(0)
    };
    if quantity <= 0 || quantity > held {
        return Err(ApiError::Validation(
            "not enough items in inventory".to_string(),
        ));
    }

    state
        .inventory_service
        .drop_item_from_inventory(&inventory, &item, quantity)
        .await
        .map_err(|e| match e {
            ServiceError::InsufficientQuantity => {
                ApiError::Validation("not enough items in inventory".to_string())
            }
            e => ApiError::internal("Unable to drop items", e),
        })?;

    Ok(Json(DropItemResponse {
        item_name: item.name,
        dropped: quantity,
    }))
}
