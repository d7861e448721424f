// Tick scheduler: the world clock. Every tick loads the active-character
// snapshot, fans one worker out per character, collects at most one update
// each through a channel sized to the snapshot, then applies the two
// batched writes. Errors are logged and skipped; the loop never exits.

use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::models::catalog::Resource;
use crate::models::character::Character;
use crate::services::catalog::CatalogService;
use crate::services::character::{CharacterService, ProgressUpdate};
use crate::services::inventory::{InventoryService, InventoryUpdate};
use crate::websocket::HubHandle;

/// What a single worker may produce for its character in one tick.
#[derive(Debug)]
pub struct TickUpdate {
    pub inventory_update: Option<InventoryUpdate>,
    pub progress_update: Option<ProgressUpdate>,
}

pub struct TickScheduler {
    tick_rate: Duration,
    characters: Arc<CharacterService>,
    inventories: Arc<InventoryService>,
    catalog: Arc<CatalogService>,
    hub: HubHandle,
    // Owned by the scheduler task alone; workers get per-tick seeds drawn
    // from it instead of sharing it.
    rng: StdRng,
}

impl TickScheduler {
    pub fn new(
        tick_rate: Duration,
        characters: Arc<CharacterService>,
        inventories: Arc<InventoryService>,
        catalog: Arc<CatalogService>,
        hub: HubHandle,
    ) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();

        Self {
            tick_rate,
            characters,
            inventories,
            catalog,
            hub,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!("Tick scheduler started ({}ms)", self.tick_rate.as_millis());
        let mut ticker = tokio::time::interval(self.tick_rate);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.process_tick().await;
        }
    }

    async fn process_tick(&mut self) {
        let snapshot = match self.characters.get_active_characters().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Failed to load active characters: {}", e);
                return;
            }
        };

        if snapshot.is_empty() {
            return;
        }

        // Fan-out with a barrier: the channel is sized to the snapshot and
        // the tick proceeds once every worker has reported or hung up.
        let (tx, mut rx) = mpsc::channel::<TickUpdate>(snapshot.len());

        for character in snapshot {
            let tx = tx.clone();
            let characters = Arc::clone(&self.characters);
            let inventories = Arc::clone(&self.inventories);
            let catalog = Arc::clone(&self.catalog);
            let hub = self.hub.clone();
            let seed: u64 = self.rng.gen();

            tokio::spawn(async move {
                if let Some(update) = process_resource_gathering(
                    &character,
                    seed,
                    &characters,
                    &inventories,
                    &catalog,
                    &hub,
                )
                .await
                {
                    let _ = tx.send(update).await;
                }
            });
        }
        drop(tx);

        let mut inventory_updates = Vec::new();
        let mut progress_updates = Vec::new();
        while let Some(update) = rx.recv().await {
            if let Some(inventory_update) = update.inventory_update {
                inventory_updates.push(inventory_update);
            }
            if let Some(progress_update) = update.progress_update {
                progress_updates.push(progress_update);
            }
        }

        if let Err(e) = self
            .inventories
            .batch_add_items_to_inventory(inventory_updates)
            .await
        {
            error!("Batch inventory write failed: {}", e);
        }

        if let Err(e) = self
            .characters
            .batch_update_character_progress(&progress_updates)
            .await
        {
            error!("Batch progress write failed: {}", e);
        }
    }
}

/// Resolve one character's gathering action for this tick. Any read failure
/// logs and skips the character; the tick carries on without it.
async fn process_resource_gathering(
    character: &Character,
    seed: u64,
    characters: &CharacterService,
    inventories: &InventoryService,
    catalog: &CatalogService,
    hub: &HubHandle,
) -> Option<TickUpdate> {
    let target = character.action_target?;

    let progress = character.action_amount_progress.unwrap_or(0);
    if let Some(limit) = character.action_amount_limit {
        if progress >= limit {
            if let Err(e) = characters.set_character_to_idle(character.id).await {
                error!("Failed to idle character {}: {}", character.name, e);
                return None;
            }
            hub.send_notification_to_user(
                character.user_id,
                &format!(
                    "Character {} finished gathering {} items and is now idle",
                    character.name, limit
                ),
                "info",
            )
            .await;
            return None;
        }
    }

    let inventory = match inventories.get_inventory_by_character_id(character.id).await {
        Ok(inventory) => inventory,
        Err(e) => {
            debug!("Skipping {}: inventory read failed: {}", character.name, e);
            return None;
        }
    };

    let spawn = match catalog.spawn_by_id(target).await {
        Ok(spawn) => spawn,
        Err(e) => {
            debug!("Skipping {}: spawn read failed: {}", character.name, e);
            return None;
        }
    };

    let resources = match catalog.resources_by_node_id(spawn.node_id).await {
        Ok(resources) => resources,
        Err(e) => {
            debug!("Skipping {}: drop table read failed: {}", character.name, e);
            return None;
        }
    };

    if resources.is_empty() {
        return None;
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    let drop = roll_drop(&resources, &mut rng);

    Some(TickUpdate {
        inventory_update: Some(InventoryUpdate {
            inventory_id: inventory.id,
            item_id: drop.item_id,
            quantity: 1,
        }),
        progress_update: character.action_amount_limit.map(|_| ProgressUpdate {
            character_id: character.id,
            progress: progress + 1,
        }),
    })
}

/// Weighted roll over a node's drop table. `drop_chance` values are relative
/// weights; a table whose weights sum to zero falls back to the first entry.
pub fn roll_drop<'a>(resources: &'a [Resource], rng: &mut impl Rng) -> &'a Resource {
    let total: i64 = resources.iter().map(|r| r.drop_chance as i64).sum();
    if total == 0 {
        return &resources[0];
    }

    let mut n = rng.gen_range(0..total);
    for resource in resources {
        n -= resource.drop_chance as i64;
        if n < 0 {
            return resource;
        }
    }

    &resources[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(id: i32, item_id: i32, drop_chance: i32) -> Resource {
        Resource {
            id,
            resource_node_id: 1,
            item_id,
            drop_chance,
        }
    }

    #[test]
    fn zero_total_falls_back_to_first_entry() {
        let table = vec![resource(1, 10, 0), resource(2, 20, 0)];
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(roll_drop(&table, &mut rng).item_id, 10);
        }
    }

    #[test]
    fn single_entry_always_wins() {
        let table = vec![resource(1, 10, 5)];
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(roll_drop(&table, &mut rng).item_id, 10);
    }

    #[test]
    fn zero_weight_entries_never_drop() {
        let table = vec![resource(1, 10, 0), resource(2, 20, 3)];
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            assert_eq!(roll_drop(&table, &mut rng).item_id, 20);
        }
    }
}
