// Library exports for the idler backend

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;
pub mod websocket;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::{DieselPool, RedisConfig, RedisPool};
pub use middleware::{auth_middleware, AuthenticatedUser};
pub use services::{
    CacheService, CatalogService, CharacterService, InventoryService, JwtError, JwtService,
    RateLimitService, TickScheduler, UserService,
};
pub use utils::ApiError;
pub use websocket::{Hub, HubHandle, WsMessage};
