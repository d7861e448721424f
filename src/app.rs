// Application state shared across handlers
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::{DieselPool, RedisPool},
    services::{
        CacheService, CatalogService, CharacterService, InventoryService, JwtService,
        RateLimitService, UserService,
    },
    websocket::HubHandle,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub redis_pool: RedisPool,
    pub cache: CacheService,
    pub jwt_service: Arc<JwtService>,
    pub rate_limit_service: Arc<RateLimitService>,
    pub user_service: Arc<UserService>,
    pub catalog_service: Arc<CatalogService>,
    pub character_service: Arc<CharacterService>,
    pub inventory_service: Arc<InventoryService>,
    pub hub: HubHandle,
}
