// Services module: business logic between the HTTP/WebSocket surface and
// the persistence/cache adapters.

use thiserror::Error;

pub mod cache;
pub mod catalog;
pub mod character;
pub mod inventory;
pub mod jwt;
pub mod rate_limit;
pub mod scheduler;
pub mod user;

// Re-export commonly used services
pub use cache::{cache_keys, ttl, CacheService};
pub use catalog::CatalogService;
pub use character::{CharacterService, ProgressUpdate};
pub use inventory::{InventoryService, InventoryUpdate, DEFAULT_INVENTORY_CAPACITY};
pub use jwt::{JwtError, JwtService};
pub use rate_limit::{RateLimitResult, RateLimitService};
pub use scheduler::TickScheduler;
pub use user::UserService;

/// Pooled database connection, as handed out by bb8.
pub type PooledConn<'a> = bb8::PooledConnection<
    'a,
    diesel_async::pooled_connection::AsyncDieselConnectionManager<diesel_async::AsyncPgConnection>,
>;

/// Shared failure surface for the domain services. Handlers translate these
/// into client-facing responses; the variants carry no internal detail
/// beyond what the logs need.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("database pool error: {0}")]
    Pool(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("character doesn't belong to user")]
    NotOwned,

    #[error("not enough items in inventory")]
    InsufficientQuantity,
}
