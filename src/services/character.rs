// Character domain service: cached lookups, ownership validation, action
// mutation and the active-character snapshot the tick scheduler runs on.
//
// Cache contract: any mutation that can change whether a character is
// active (create, action update, set-idle) and any write of progress must
// invalidate `active_characters`, or the next tick acts on a stale snapshot.

use std::sync::Arc;
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::character::Character;
use crate::models::inventory::Inventory;
use crate::services::cache::{cache_keys, ttl, CacheService};
use crate::services::catalog::CatalogService;
use crate::services::inventory::DEFAULT_INVENTORY_CAPACITY;
use crate::services::{PooledConn, ServiceError};

/// Absolute progress value for one character after a tick.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub character_id: Uuid,
    pub progress: i32,
}

pub struct CharacterService {
    pool: DieselPool,
    cache: CacheService,
    catalog: Arc<CatalogService>,
}

impl CharacterService {
    pub fn new(pool: DieselPool, cache: CacheService, catalog: Arc<CatalogService>) -> Self {
        Self {
            pool,
            cache,
            catalog,
        }
    }

    async fn conn(&self) -> Result<PooledConn<'_>, ServiceError> {
        self.pool
            .get()
            .await
            .map_err(|e| ServiceError::Pool(e.to_string()))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Character, ServiceError> {
        let key = cache_keys::character_name(name);
        if let Some(character) = self.cache.get_json::<Character>(&key).await {
            return Ok(character);
        }

        let mut conn = self.conn().await?;
        let character = Character::find_by_name(&mut conn, name)
            .await?
            .ok_or(ServiceError::NotFound("character"))?;

        self.cache.set_json(&key, &character, ttl::CHARACTER).await;
        Ok(character)
    }

    pub async fn get_by_id(&self, character_id: Uuid) -> Result<Character, ServiceError> {
        let key = cache_keys::character_id(character_id);
        if let Some(character) = self.cache.get_json::<Character>(&key).await {
            return Ok(character);
        }

        let mut conn = self.conn().await?;
        let character = Character::find_by_id(&mut conn, character_id)
            .await?
            .ok_or(ServiceError::NotFound("character"))?;

        self.cache.set_json(&key, &character, ttl::CHARACTER).await;
        Ok(character)
    }

    /// The only way handlers may resolve a character for a mutating request.
    pub async fn get_with_ownership_validation(
        &self,
        name: &str,
        user_id: Uuid,
    ) -> Result<Character, ServiceError> {
        let character = self.get_by_name(name).await?;
        if character.user_id != user_id {
            return Err(ServiceError::NotOwned);
        }
        Ok(character)
    }

    pub async fn get_by_coordinates(&self, x: i32, y: i32) -> Result<Vec<Character>, ServiceError> {
        let mut conn = self.conn().await?;
        Ok(Character::find_by_coordinates(&mut conn, x, y).await?)
    }

    /// Create a character with its empty inventory, atomically.
    pub async fn create_character(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<(Character, Inventory), ServiceError> {
        let idle = self.catalog.idle_action().await?;

        let mut conn = self.conn().await?;
        let created = Character::create_with_inventory(
            &mut conn,
            user_id,
            name,
            idle.id,
            DEFAULT_INVENTORY_CAPACITY,
        )
        .await?;

        self.invalidate_active_characters_cache().await;
        Ok(created)
    }

    pub async fn update_character_action(
        &self,
        character: &Character,
        action_id: i32,
        action_target: Option<i32>,
        amount_limit: Option<i32>,
    ) -> Result<Character, ServiceError> {
        let mut conn = self.conn().await?;
        let updated = Character::update_action(
            &mut conn,
            character.id,
            action_id,
            action_target,
            amount_limit,
        )
        .await?;

        self.cache
            .invalidate_character(character.id, &character.name)
            .await;
        Ok(updated)
    }

    /// Transition to IDLE, clearing target, amount limit and progress.
    pub async fn set_character_to_idle(&self, character_id: Uuid) -> Result<Character, ServiceError> {
        let idle = self.catalog.idle_action().await?;

        let mut conn = self.conn().await?;
        let character = Character::set_idle(&mut conn, character_id, idle.id).await?;

        self.cache
            .invalidate_character(character.id, &character.name)
            .await;
        Ok(character)
    }

    /// The tick snapshot: every non-idle character, cached briefly.
    pub async fn get_active_characters(&self) -> Result<Vec<Character>, ServiceError> {
        let key = cache_keys::active_characters();
        if let Some(characters) = self.cache.get_json::<Vec<Character>>(&key).await {
            return Ok(characters);
        }

        let idle = self.catalog.idle_action().await?;

        let mut conn = self.conn().await?;
        let characters = Character::find_active(&mut conn, idle.id).await?;

        self.cache
            .set_json(&key, &characters, ttl::ACTIVE_CHARACTERS)
            .await;
        Ok(characters)
    }

    pub async fn batch_update_character_progress(
        &self,
        updates: &[ProgressUpdate],
    ) -> Result<(), ServiceError> {
        if updates.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = updates.iter().map(|u| u.character_id).collect();
        let progress: Vec<i32> = updates.iter().map(|u| u.progress).collect();

        let mut conn = self.conn().await?;
        Character::batch_update_progress(&mut conn, &ids, &progress).await?;

        // The snapshot carries progress values; the next tick must see them.
        self.invalidate_active_characters_cache().await;
        Ok(())
    }

    pub async fn invalidate_active_characters_cache(&self) {
        self.cache.del(&cache_keys::active_characters()).await;
    }
}
