// Middleware: authentication, CORS and rate limiting.

pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::{auth_middleware, bearer_token, AuthenticatedUser};
pub use cors::cors_middleware;
pub use rate_limit::rate_limit_middleware;
