// Fixed-window rate limiting backed by Redis.
// One counter per subject (authenticated user id, the shared "unauth"
// bucket, or a ws:<uid> inbound-message bucket), expiring with the window.

use std::time::Duration;
use tracing::warn;

use crate::services::cache::{cache_keys, ttl, CacheService};

/// Requests per minute for authenticated subjects.
pub const AUTHENTICATED_PER_MINUTE: u32 = 100;
/// Requests per minute shared by all unauthenticated traffic.
pub const UNAUTHENTICATED_PER_MINUTE: u32 = 30;
/// Inbound WebSocket messages per minute per user.
pub const WEBSOCKET_PER_MINUTE: u32 = 50;

/// Subject key for requests with no authenticated user.
pub const UNAUTHENTICATED_SUBJECT: &str = "unauth";

#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub window: Duration,
    pub current_count: i64,
}

pub struct RateLimitService {
    cache: CacheService,
}

impl RateLimitService {
    pub fn new(cache: CacheService) -> Self {
        Self { cache }
    }

    /// Count this request against the subject's window and decide.
    /// A Redis failure fails open: the request is allowed and logged.
    pub async fn check(&self, subject: &str, limit: u32) -> RateLimitResult {
        self.check_with_window(subject, limit, ttl::RATE_LIMIT_WINDOW)
            .await
    }

    pub async fn check_with_window(
        &self,
        subject: &str,
        limit: u32,
        window: Duration,
    ) -> RateLimitResult {
        let key = cache_keys::rate_limit(subject);

        match self.cache.incr_fixed_window(&key, window).await {
            Ok(count) => RateLimitResult {
                allowed: count <= limit as i64,
                limit,
                window,
                current_count: count,
            },
            Err(e) => {
                warn!("Rate limit check failed for {}: {}", subject, e);
                RateLimitResult {
                    allowed: true,
                    limit,
                    window,
                    current_count: 0,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_match_policy() {
        assert_eq!(AUTHENTICATED_PER_MINUTE, 100);
        assert_eq!(UNAUTHENTICATED_PER_MINUTE, 30);
        assert_eq!(WEBSOCKET_PER_MINUTE, 50);
        assert_eq!(ttl::RATE_LIMIT_WINDOW.as_secs(), 60);
    }
}
