// Centralized configuration management.
// Every environment variable is read exactly once, at startup.

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("JWT_SECRET must be between 32 and 512 characters")]
    JwtSecretLength,
    #[error("JWT_SECRET entropy too low ({0:.2} bits/char, need >= 4.0)")]
    JwtSecretEntropy(f64),
}

/// Global application configuration loaded once at startup. A malformed
/// environment aborts the process before any pool is opened.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    AppConfig::from_env().expect("Failed to load configuration")
});

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Server
    pub bind_address: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    pub database_connect_timeout: Duration,
    pub database_idle_timeout: Duration,
    pub database_max_lifetime: Duration,

    // Redis
    pub redis_url: String,
    pub redis_pool_size: u32,

    // Sessions
    pub jwt_secret: String,

    // World clock
    pub tick_rate: Duration,

    // CORS / WebSocket origins
    pub cors_allowed_origins: Vec<String>,
    pub ws_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = database_url_from_env()?;
        let redis_url = redis_url_from_env()?;

        let jwt_secret = require_var("JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret)?;

        let tick_ms: u64 = require_var("TICK_MS")?
            .parse()
            .map_err(|e| ConfigError::InvalidValue("TICK_MS".into(), format!("{}", e)))?;
        if tick_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "TICK_MS".into(),
                "must be greater than zero".into(),
            ));
        }

        let cors_allowed_origins = split_origins(
            &env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:*, https://localhost:*".to_string()),
        );
        let ws_allowed_origins =
            split_origins(&env::var("ALLOWED_ORIGINS").unwrap_or_default());

        Ok(AppConfig {
            bind_address: "0.0.0.0:8080".to_string(),
            database_url,
            database_max_connections: parse_var_or("DB_MAX_CONNECTIONS", 25)?,
            database_min_connections: parse_var_or("DB_MIN_CONNECTIONS", 5)?,
            database_connect_timeout: Duration::from_secs(5),
            database_idle_timeout: Duration::from_secs(15 * 60),
            database_max_lifetime: Duration::from_secs(60 * 60),
            redis_url,
            redis_pool_size: parse_var_or("REDIS_POOL_SIZE", 10)?,
            jwt_secret,
            tick_rate: Duration::from_millis(tick_ms),
            cors_allowed_origins,
            ws_allowed_origins,
        })
    }
}

fn require_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn parse_var_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

/// Assemble the Postgres DSN from its component variables.
fn database_url_from_env() -> Result<String, ConfigError> {
    let user = require_var("DB_USER")?;
    let password = require_var("DB_PASSWORD")?;
    let host = require_var("DB_HOST")?;
    let port = require_var("DB_PORT")?;
    let name = require_var("DB_NAME")?;

    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, name
    ))
}

fn redis_url_from_env() -> Result<String, ConfigError> {
    let address = require_var("REDIS_ADDRESS")?;
    let password = env::var("REDIS_PASSWORD").unwrap_or_default();

    if password.is_empty() {
        Ok(format!("redis://{}", address))
    } else {
        Ok(format!("redis://:{}@{}", password, address))
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A signing secret that is long but repetitive is as weak as a short one,
/// so both length and per-character entropy gate the boot.
fn validate_jwt_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < 32 || secret.len() > 512 {
        return Err(ConfigError::JwtSecretLength);
    }

    let entropy = shannon_entropy(secret);
    if entropy < 4.0 {
        return Err(ConfigError::JwtSecretEntropy(entropy));
    }

    Ok(())
}

/// Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut counts = std::collections::HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0usize) += 1;
    }

    let len = s.chars().count() as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_uniform_string() {
        // 16 distinct characters => exactly 4 bits/char
        let secret = "abcdefghijklmnop";
        assert!((shannon_entropy(secret) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn entropy_of_repetitive_string_is_low() {
        assert_eq!(shannon_entropy("aaaaaaaa"), 0.0);
        assert!(shannon_entropy("abababab") < 1.5);
    }

    #[test]
    fn secret_validation() {
        assert!(matches!(
            validate_jwt_secret("short"),
            Err(ConfigError::JwtSecretLength)
        ));
        assert!(matches!(
            validate_jwt_secret(&"ab".repeat(32)),
            Err(ConfigError::JwtSecretEntropy(_))
        ));
        assert!(validate_jwt_secret("Zx9#mQ2$vL5pRw8!tKf3@nYh6&uJc1EdGbAs47").is_ok());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let origins = split_origins("http://localhost:*, https://localhost:*");
        assert_eq!(
            origins,
            vec!["http://localhost:*", "https://localhost:*"]
        );
        assert!(split_origins("").is_empty());
    }
}
