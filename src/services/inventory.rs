// Inventory domain service: capacity-checked batch additions from the tick
// loop, explicit drops from the API, and the best-tool scan the action
// gate uses.
//
// The capacity check here is read-then-write, not atomic with the batch
// insert. Inventories are 1:1 with characters and a character produces at
// most one update per tick, so the window is acceptable; a shared-inventory
// model would need a conditional INSERT instead.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::catalog::{Item, ToolType};
use crate::models::inventory::{Inventory, InventoryItem};
use crate::services::cache::{cache_keys, ttl, CacheService};
use crate::services::catalog::CatalogService;
use crate::services::character::CharacterService;
use crate::services::{PooledConn, ServiceError};
use crate::websocket::HubHandle;

/// Capacity for newly created inventories.
pub const DEFAULT_INVENTORY_CAPACITY: i32 = 50;

/// One item stack headed into an inventory.
#[derive(Debug, Clone)]
pub struct InventoryUpdate {
    pub inventory_id: Uuid,
    pub item_id: i32,
    pub quantity: i32,
}

/// True when the stack fits: weight + item_weight * quantity <= capacity.
pub fn fits_capacity(weight: i32, capacity: i32, item_weight: i32, quantity: i32) -> bool {
    weight + item_weight * quantity <= capacity
}

/// Sum the weight contribution of allowed updates per inventory, so each
/// inventory gets one additive weight write per batch.
pub fn group_weight_deltas(updates: &[(InventoryUpdate, i32)]) -> HashMap<Uuid, i32> {
    let mut deltas = HashMap::new();
    for (update, item_weight) in updates {
        *deltas.entry(update.inventory_id).or_insert(0) += item_weight * update.quantity;
    }
    deltas
}

pub struct InventoryService {
    pool: DieselPool,
    cache: CacheService,
    catalog: Arc<CatalogService>,
    characters: Arc<CharacterService>,
    hub: HubHandle,
}

impl InventoryService {
    pub fn new(
        pool: DieselPool,
        cache: CacheService,
        catalog: Arc<CatalogService>,
        characters: Arc<CharacterService>,
        hub: HubHandle,
    ) -> Self {
        Self {
            pool,
            cache,
            catalog,
            characters,
            hub,
        }
    }

    async fn conn(&self) -> Result<PooledConn<'_>, ServiceError> {
        self.pool
            .get()
            .await
            .map_err(|e| ServiceError::Pool(e.to_string()))
    }

    pub async fn get_inventory_by_character_id(
        &self,
        character_id: Uuid,
    ) -> Result<Inventory, ServiceError> {
        let key = cache_keys::inventory_by_character(character_id);
        if let Some(inventory) = self.cache.get_json::<Inventory>(&key).await {
            return Ok(inventory);
        }

        let mut conn = self.conn().await?;
        let inventory = Inventory::find_by_character_id(&mut conn, character_id)
            .await?
            .ok_or(ServiceError::NotFound("inventory"))?;

        self.cache.set_json(&key, &inventory, ttl::INVENTORY).await;
        Ok(inventory)
    }

    pub async fn get_inventory_items(
        &self,
        inventory_id: Uuid,
    ) -> Result<Vec<InventoryItem>, ServiceError> {
        let key = cache_keys::inventory_items(inventory_id);
        if let Some(items) = self.cache.get_json::<Vec<InventoryItem>>(&key).await {
            return Ok(items);
        }

        let mut conn = self.conn().await?;
        let items = InventoryItem::by_inventory_id(&mut conn, inventory_id).await?;

        self.cache
            .set_json(&key, &items, ttl::INVENTORY_ITEMS)
            .await;
        Ok(items)
    }

    pub async fn check_inventory_capacity(
        &self,
        inventory: &Inventory,
        item: &Item,
        quantity: i32,
    ) -> bool {
        fits_capacity(inventory.weight, inventory.capacity, item.weight, quantity)
    }

    /// Additive weight write plus invalidation of the owning character's
    /// cached inventory summary.
    pub async fn update_inventory_weight(
        &self,
        inventory_id: Uuid,
        delta: i32,
    ) -> Result<(), ServiceError> {
        let mut conn = self.conn().await?;
        Inventory::adjust_weight(&mut conn, inventory_id, delta).await?;

        if let Some(inventory) = Inventory::find_by_id(&mut conn, inventory_id).await? {
            self.cache
                .del(&cache_keys::inventory_by_character(inventory.character_id))
                .await;
        }
        Ok(())
    }

    /// Apply a tick's inventory additions. Updates that would exceed
    /// capacity are rejected and trigger an inventory-full notification;
    /// the rest land in one atomic batch, followed by per-inventory weight
    /// deltas and cache invalidation.
    pub async fn batch_add_items_to_inventory(
        &self,
        updates: Vec<InventoryUpdate>,
    ) -> Result<(), ServiceError> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut allowed: Vec<(InventoryUpdate, i32)> = Vec::new();
        let mut rejected: Vec<Uuid> = Vec::new();

        for update in updates {
            let mut conn = self.conn().await?;
            let Some(inventory) = Inventory::find_by_id(&mut conn, update.inventory_id).await?
            else {
                tracing::warn!("Skipping update for missing inventory {}", update.inventory_id);
                continue;
            };
            drop(conn);

            let item = self.catalog.item_by_id(update.item_id).await?;

            if self
                .check_inventory_capacity(&inventory, &item, update.quantity)
                .await
            {
                allowed.push((update, item.weight));
            } else {
                rejected.push(inventory.id);
            }
        }

        for inventory_id in rejected {
            if let Err(e) = self.send_inventory_full_notification(inventory_id).await {
                tracing::warn!(
                    "Failed to deliver inventory-full notification for {}: {}",
                    inventory_id,
                    e
                );
            }
        }

        if allowed.is_empty() {
            return Ok(());
        }

        let inventory_ids: Vec<Uuid> = allowed.iter().map(|(u, _)| u.inventory_id).collect();
        let item_ids: Vec<i32> = allowed.iter().map(|(u, _)| u.item_id).collect();
        let quantities: Vec<i32> = allowed.iter().map(|(u, _)| u.quantity).collect();

        {
            let mut conn = self.conn().await?;
            InventoryItem::batch_add(&mut conn, &inventory_ids, &item_ids, &quantities).await?;
        }

        for (inventory_id, delta) in group_weight_deltas(&allowed) {
            self.update_inventory_weight(inventory_id, delta).await?;
        }

        for (update, _) in &allowed {
            self.cache
                .del(&cache_keys::inventory_items(update.inventory_id))
                .await;
        }

        Ok(())
    }

    /// Current held quantity, read straight from the store (the drop path
    /// must not act on a stale items cache).
    pub async fn get_item_quantity(
        &self,
        inventory_id: Uuid,
        item_id: i32,
    ) -> Result<i32, ServiceError> {
        let mut conn = self.conn().await?;
        Ok(InventoryItem::find(&mut conn, inventory_id, item_id)
            .await?
            .map(|row| row.quantity)
            .unwrap_or(0))
    }

    /// Remove a quantity of an item, failing fast when more is requested
    /// than held.
    pub async fn drop_item_from_inventory(
        &self,
        inventory: &Inventory,
        item: &Item,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let mut conn = self.conn().await?;

        let current = InventoryItem::find(&mut conn, inventory.id, item.id)
            .await?
            .map(|row| row.quantity)
            .unwrap_or(0);
        if quantity > current {
            return Err(ServiceError::InsufficientQuantity);
        }

        let removed = InventoryItem::remove(&mut conn, inventory.id, item.id, quantity).await?;
        if removed == 0 {
            return Err(ServiceError::InsufficientQuantity);
        }

        InventoryItem::delete_empty(&mut conn, inventory.id).await?;
        drop(conn);

        self.update_inventory_weight(inventory.id, -(item.weight * quantity))
            .await?;
        self.cache
            .del(&cache_keys::inventory_items(inventory.id))
            .await;

        Ok(())
    }

    /// The highest-tier tool in the character's inventory matching the
    /// required type at or above the minimum tier. None when unequipped.
    pub async fn get_best_tool_for_type(
        &self,
        character_id: Uuid,
        tool_type_id: i32,
        min_tier: i32,
    ) -> Result<Option<(Item, ToolType)>, ServiceError> {
        let inventory = self.get_inventory_by_character_id(character_id).await?;
        let rows = self.get_inventory_items(inventory.id).await?;

        let mut best: Option<(Item, ToolType)> = None;
        for row in rows {
            let item = self.catalog.item_by_id(row.item_id).await?;
            let Some(item_tool_type) = item.tool_type_id else {
                continue;
            };
            if item_tool_type != tool_type_id {
                continue;
            }

            let tool_type = self.catalog.tool_type_by_id(item_tool_type).await?;
            if tool_type.tier < min_tier {
                continue;
            }

            let better = match &best {
                Some((_, current)) => tool_type.tier > current.tier,
                None => true,
            };
            if better {
                best = Some((item, tool_type));
            }
        }

        Ok(best)
    }

    /// A rejected addition idles the character and tells the player why.
    pub async fn send_inventory_full_notification(
        &self,
        inventory_id: Uuid,
    ) -> Result<(), ServiceError> {
        let mut conn = self.conn().await?;
        let inventory = Inventory::find_by_id(&mut conn, inventory_id)
            .await?
            .ok_or(ServiceError::NotFound("inventory"))?;
        drop(conn);

        let character = self.characters.get_by_id(inventory.character_id).await?;
        self.characters.set_character_to_idle(character.id).await?;

        self.hub
            .send_notification_to_user(
                character.user_id,
                &format!(
                    "Inventory is full for character {}! Character set to idle.",
                    character.name
                ),
                "warning",
            )
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_boundary() {
        // 40 + 2*5 == 50 fits exactly
        assert!(fits_capacity(40, 50, 5, 2));
        assert!(!fits_capacity(41, 50, 5, 2));
        assert!(fits_capacity(0, 50, 0, 100));
    }

    fn update(inventory_id: Uuid, item_id: i32, quantity: i32) -> InventoryUpdate {
        InventoryUpdate {
            inventory_id,
            item_id,
            quantity,
        }
    }

    #[test]
    fn weight_deltas_group_by_inventory() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let allowed = vec![
            (update(a, 1, 1), 3),
            (update(a, 2, 2), 5),
            (update(b, 1, 4), 3),
        ];

        let deltas = group_weight_deltas(&allowed);
        assert_eq!(deltas[&a], 3 + 10);
        assert_eq!(deltas[&b], 12);
        assert_eq!(deltas.len(), 2);
    }
}
