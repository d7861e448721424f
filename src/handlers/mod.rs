// HTTP surface: request decode, authentication, validation, delegation to
// the domain services.

pub mod actions;
pub mod auth;
pub mod characters;
pub mod inventory;
pub mod sense;
pub mod users;
pub mod ws;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::app::AppState;

/// Routes that carry no session JWT: signup, login and the refresh-token
/// endpoints (those authenticate with the refresh token itself).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(users::create_user))
        .route("/api/login", post(auth::login))
        .route("/api/refresh", post(auth::refresh))
        .route("/api/revoke", post(auth::revoke))
}

/// Routes behind the blacklist-aware JWT middleware.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", put(users::update_user))
        .route(
            "/api/characters",
            post(characters::create_character).put(characters::update_character),
        )
        .route(
            "/api/characters/{name}/select",
            get(characters::select_character),
        )
        .route("/api/actions", get(actions::get_actions))
        .route("/api/sense/area/{name}", get(sense::sense_area))
        .route("/api/inventory/{name}", get(inventory::get_inventory))
        .route("/api/inventory/drop", post(inventory::drop_item))
}
