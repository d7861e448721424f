use std::time::Duration;

/// Redis connection configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub redis_url: String,
    pub pool_size: u32,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl RedisConfig {
    /// Create configuration from centralized app config
    pub fn from_env() -> Self {
        let config = crate::app_config::config();

        Self {
            redis_url: config.redis_url.clone(),
            pool_size: config.redis_pool_size,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(100),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.redis_url.is_empty() {
            return Err("Redis URL cannot be empty".to_string());
        }

        if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://") {
            return Err("Redis URL must start with redis:// or rediss://".to_string());
        }

        if self.pool_size == 0 {
            return Err("Redis pool size must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_bad_urls() {
        let config = RedisConfig {
            redis_url: "http://localhost:6379".to_string(),
            pool_size: 4,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(100),
        };
        assert!(config.validate().is_err());

        let config = RedisConfig {
            redis_url: "redis://localhost:6379".to_string(),
            ..config
        };
        assert!(config.validate().is_ok());
    }
}
