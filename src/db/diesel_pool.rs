// Diesel-async + bb8 connection pooling over Postgres.

use bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use std::time::Duration;

pub type DieselPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Database pool configuration
#[derive(Debug, Clone)]
pub struct DieselDatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub test_on_checkout: bool,
}

impl Default for DieselDatabaseConfig {
    fn default() -> Self {
        let config = crate::app_config::config();
        Self {
            url: config.database_url.clone(),
            max_connections: config.database_max_connections,
            min_connections: config.database_min_connections,
            connection_timeout: config.database_connect_timeout,
            idle_timeout: config.database_idle_timeout,
            max_lifetime: config.database_max_lifetime,
            test_on_checkout: true,
        }
    }
}

/// Create the Diesel connection pool and verify one connection checks out.
pub async fn create_diesel_pool(
    config: DieselDatabaseConfig,
) -> Result<DieselPool, Box<dyn std::error::Error>> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.clone());

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(config.connection_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .test_on_check_out(config.test_on_checkout)
        .build(manager)
        .await?;

    let conn = pool.get().await?;
    drop(conn);

    tracing::info!(
        "Diesel pool initialized with {} max connections",
        config.max_connections
    );

    Ok(pool)
}

/// Health check for the database pool.
pub async fn check_diesel_health(pool: &DieselPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get().await?;
    drop(conn);
    Ok(())
}

/// Mask database connection string credentials for logging.
pub fn mask_connection_string(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let scheme = parsed.scheme();
        let host = parsed.host_str().unwrap_or("***");
        let path = parsed.path();

        let normalized_scheme = if scheme == "postgres" {
            "postgresql"
        } else {
            scheme
        };

        if parsed.username().is_empty() && parsed.password().is_none() {
            format!("{}://{}{}", normalized_scheme, host, path)
        } else {
            format!("{}://***:***@{}{}", normalized_scheme, host, path)
        }
    } else {
        "postgresql://***:***@***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_masked() {
        assert_eq!(
            mask_connection_string("postgres://idler:hunter2@db:5432/idler"),
            "postgresql://***:***@db/idler"
        );
        assert_eq!(
            mask_connection_string("not a url"),
            "postgresql://***:***@***"
        );
    }
}
