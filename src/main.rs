// Module declarations
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

use axum::{middleware as axum_middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app::AppState,
    db::{create_diesel_pool, mask_connection_string, DieselDatabaseConfig, RedisConfig, RedisPool},
    handlers::{public_routes, protected_routes, ws::ws_handler},
    middleware::{auth_middleware, cors_middleware, rate_limit_middleware},
    services::{
        CacheService, CatalogService, CharacterService, InventoryService, JwtService,
        RateLimitService, TickScheduler, UserService,
    },
    websocket::Hub,
};

/// The actions catalog is tiny and hot; warm it at boot under a short
/// timeout so a slow cache cannot stall startup.
const ACTIONS_WARMUP_TIMEOUT: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idler_server=debug,axum=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Centralized config; aborts on a malformed environment (bad JWT secret
    // included)
    let config = crate::app_config::config();
    info!("=== STARTING IDLER SERVER ===");

    // Database pool
    info!("Initializing database pool...");
    let db_config = DieselDatabaseConfig::default();
    info!("Database URL: {}", mask_connection_string(&db_config.url));

    let diesel_pool = match create_diesel_pool(db_config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database pool: {}", e);
            return Err(format!("Database initialization failed: {}", e).into());
        }
    };

    // Redis pool
    info!("Initializing Redis pool...");
    let redis_config = RedisConfig::from_env();
    let redis_pool = match RedisPool::new(redis_config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize Redis pool: {}", e);
            return Err(format!("Redis initialization failed: {}", e).into());
        }
    };

    let cache = CacheService::new(redis_pool.clone());

    // WebSocket hub: started before the services so they can hold its handle
    let (hub, _hub_task) = Hub::spawn();

    // Domain services
    let jwt_service = Arc::new(JwtService::with_cache(&config.jwt_secret, cache.clone()));
    let rate_limit_service = Arc::new(RateLimitService::new(cache.clone()));
    let user_service = Arc::new(UserService::new(diesel_pool.clone(), cache.clone()));
    let catalog_service = Arc::new(CatalogService::new(diesel_pool.clone(), cache.clone()));
    let character_service = Arc::new(CharacterService::new(
        diesel_pool.clone(),
        cache.clone(),
        Arc::clone(&catalog_service),
    ));
    let inventory_service = Arc::new(InventoryService::new(
        diesel_pool.clone(),
        cache.clone(),
        Arc::clone(&catalog_service),
        Arc::clone(&character_service),
        hub.clone(),
    ));

    // Warm the actions cache; failure is logged, not fatal
    match tokio::time::timeout(ACTIONS_WARMUP_TIMEOUT, catalog_service.all_actions()).await {
        Ok(Ok(actions)) => info!("Actions cache warmed ({} actions)", actions.len()),
        Ok(Err(e)) => warn!("Actions cache warmup failed: {}", e),
        Err(_) => warn!("Actions cache warmup timed out"),
    }

    let app_state = AppState {
        config: Arc::new(config.clone()),
        diesel_pool,
        redis_pool,
        cache,
        jwt_service,
        rate_limit_service,
        user_service,
        catalog_service: Arc::clone(&catalog_service),
        character_service: Arc::clone(&character_service),
        inventory_service: Arc::clone(&inventory_service),
        hub: hub.clone(),
    };

    // Tick scheduler: the world clock
    let _scheduler_task = TickScheduler::new(
        config.tick_rate,
        character_service,
        inventory_service,
        catalog_service,
        hub,
    )
    .spawn();

    // Router: WebSocket upgrade and public routes outside the auth layer,
    // everything rate limited, everything CORS'd
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .merge(public_routes())
        .merge(protected_routes().route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        )))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(cors_middleware))
                .layer(axum_middleware::from_fn_with_state(
                    app_state.clone(),
                    rate_limit_middleware,
                )),
        )
        .with_state(app_state);

    let addr: SocketAddr = config.bind_address.parse()?;
    info!("Starting HTTP server on {}...", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
