// Cached accessors over the static catalog: actions, items, tool types,
// resource nodes, spawns and drop tables. All read-through with the 24h
// catalog TTL; the underlying rows only change on reseed.

use crate::db::DieselPool;
use crate::models::catalog::{
    Action, Item, Resource, ResourceNode, ResourceNodeSpawn, ToolType, IDLE_ACTION_NAME,
};
use crate::services::cache::{cache_keys, ttl, CacheService};
use crate::services::{PooledConn, ServiceError};

pub struct CatalogService {
    pool: DieselPool,
    cache: CacheService,
}

impl CatalogService {
    pub fn new(pool: DieselPool, cache: CacheService) -> Self {
        Self { pool, cache }
    }

    async fn conn(&self) -> Result<PooledConn<'_>, ServiceError> {
        self.pool
            .get()
            .await
            .map_err(|e| ServiceError::Pool(e.to_string()))
    }

    pub async fn action_by_id(&self, action_id: i32) -> Result<Action, ServiceError> {
        let key = cache_keys::action(action_id);
        if let Some(action) = self.cache.get_json::<Action>(&key).await {
            return Ok(action);
        }

        let mut conn = self.conn().await?;
        let action = Action::by_id(&mut conn, action_id)
            .await?
            .ok_or(ServiceError::NotFound("action"))?;

        self.cache.set_json(&key, &action, ttl::CATALOG).await;
        Ok(action)
    }

    pub async fn action_by_name(&self, name: &str) -> Result<Action, ServiceError> {
        let key = cache_keys::action_name(name);
        if let Some(action) = self.cache.get_json::<Action>(&key).await {
            return Ok(action);
        }

        let mut conn = self.conn().await?;
        let action = Action::by_name(&mut conn, name)
            .await?
            .ok_or(ServiceError::NotFound("action"))?;

        self.cache.set_json(&key, &action, ttl::CATALOG).await;
        Ok(action)
    }

    pub async fn idle_action(&self) -> Result<Action, ServiceError> {
        self.action_by_name(IDLE_ACTION_NAME).await
    }

    pub async fn all_actions(&self) -> Result<Vec<Action>, ServiceError> {
        let key = cache_keys::actions_all();
        if let Some(actions) = self.cache.get_json::<Vec<Action>>(&key).await {
            return Ok(actions);
        }

        let mut conn = self.conn().await?;
        let actions = Action::all(&mut conn).await?;

        self.cache.set_json(&key, &actions, ttl::CATALOG).await;
        Ok(actions)
    }

    pub async fn item_by_id(&self, item_id: i32) -> Result<Item, ServiceError> {
        let key = cache_keys::item(item_id);
        if let Some(item) = self.cache.get_json::<Item>(&key).await {
            return Ok(item);
        }

        let mut conn = self.conn().await?;
        let item = Item::by_id(&mut conn, item_id)
            .await?
            .ok_or(ServiceError::NotFound("item"))?;

        self.cache.set_json(&key, &item, ttl::CATALOG).await;
        Ok(item)
    }

    pub async fn item_by_name(&self, name: &str) -> Result<Item, ServiceError> {
        let key = cache_keys::item_name(name);
        if let Some(item) = self.cache.get_json::<Item>(&key).await {
            return Ok(item);
        }

        let mut conn = self.conn().await?;
        let item = Item::by_name(&mut conn, name)
            .await?
            .ok_or(ServiceError::NotFound("item"))?;

        self.cache.set_json(&key, &item, ttl::CATALOG).await;
        Ok(item)
    }

    pub async fn tool_type_by_id(&self, tool_type_id: i32) -> Result<ToolType, ServiceError> {
        let key = cache_keys::tool_type(tool_type_id);
        if let Some(tool_type) = self.cache.get_json::<ToolType>(&key).await {
            return Ok(tool_type);
        }

        let mut conn = self.conn().await?;
        let tool_type = ToolType::by_id(&mut conn, tool_type_id)
            .await?
            .ok_or(ServiceError::NotFound("tool type"))?;

        self.cache.set_json(&key, &tool_type, ttl::CATALOG).await;
        Ok(tool_type)
    }

    pub async fn resource_node_by_id(&self, node_id: i32) -> Result<ResourceNode, ServiceError> {
        let key = cache_keys::resource_node(node_id);
        if let Some(node) = self.cache.get_json::<ResourceNode>(&key).await {
            return Ok(node);
        }

        let mut conn = self.conn().await?;
        let node = ResourceNode::by_id(&mut conn, node_id)
            .await?
            .ok_or(ServiceError::NotFound("resource node"))?;

        self.cache.set_json(&key, &node, ttl::CATALOG).await;
        Ok(node)
    }

    pub async fn resources_by_node_id(&self, node_id: i32) -> Result<Vec<Resource>, ServiceError> {
        let key = cache_keys::resources_by_node(node_id);
        if let Some(resources) = self.cache.get_json::<Vec<Resource>>(&key).await {
            return Ok(resources);
        }

        let mut conn = self.conn().await?;
        let resources = Resource::by_node_id(&mut conn, node_id).await?;

        self.cache.set_json(&key, &resources, ttl::CATALOG).await;
        Ok(resources)
    }

    pub async fn spawn_by_id(&self, spawn_id: i32) -> Result<ResourceNodeSpawn, ServiceError> {
        let key = cache_keys::resource_node_spawn(spawn_id);
        if let Some(spawn) = self.cache.get_json::<ResourceNodeSpawn>(&key).await {
            return Ok(spawn);
        }

        let mut conn = self.conn().await?;
        let spawn = ResourceNodeSpawn::by_id(&mut conn, spawn_id)
            .await?
            .ok_or(ServiceError::NotFound("resource node spawn"))?;

        self.cache.set_json(&key, &spawn, ttl::CATALOG).await;
        Ok(spawn)
    }

    pub async fn spawns_by_coordinates(
        &self,
        x: i32,
        y: i32,
    ) -> Result<Vec<ResourceNodeSpawn>, ServiceError> {
        let key = cache_keys::resource_nodes_at(x, y);
        if let Some(spawns) = self.cache.get_json::<Vec<ResourceNodeSpawn>>(&key).await {
            return Ok(spawns);
        }

        let mut conn = self.conn().await?;
        let spawns = ResourceNodeSpawn::by_coordinates(&mut conn, x, y).await?;

        self.cache.set_json(&key, &spawns, ttl::CATALOG).await;
        Ok(spawns)
    }
}
