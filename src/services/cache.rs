// Read-through cache over Redis.
// Values are serialized as JSON. A read error (or a value that no longer
// decodes) is a miss; a write error is logged and never surfaced, so every
// caller transparently degrades to the database.

use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::db::RedisPool;

/// Every cache key format used by the engine, in one place.
pub mod cache_keys {
    use uuid::Uuid;

    pub fn action(id: i32) -> String {
        format!("action:{}", id)
    }

    pub fn action_name(name: &str) -> String {
        format!("action:name:{}", name)
    }

    pub fn actions_all() -> String {
        "actions:all".to_string()
    }

    pub fn item(id: i32) -> String {
        format!("item:{}", id)
    }

    pub fn item_name(name: &str) -> String {
        format!("item:name:{}", name)
    }

    pub fn tool_type(id: i32) -> String {
        format!("tool_type:{}", id)
    }

    pub fn character_id(id: Uuid) -> String {
        format!("character:id:{}", id)
    }

    pub fn character_name(name: &str) -> String {
        format!("character:name:{}", name)
    }

    pub fn inventory_by_character(character_id: Uuid) -> String {
        format!("inventory:char:{}", character_id)
    }

    pub fn inventory_items(inventory_id: Uuid) -> String {
        format!("inventory_items:inv:{}", inventory_id)
    }

    pub fn resource_node(id: i32) -> String {
        format!("resource_node:{}", id)
    }

    pub fn resources_by_node(node_id: i32) -> String {
        format!("resources:node:{}", node_id)
    }

    pub fn resource_nodes_at(x: i32, y: i32) -> String {
        format!("resource_nodes:{}:{}", x, y)
    }

    pub fn resource_node_spawn(id: i32) -> String {
        format!("resource_node_spawn:{}", id)
    }

    pub fn active_characters() -> String {
        "active_characters".to_string()
    }

    pub fn user_surname(user_id: Uuid) -> String {
        format!("user:surname:{}", user_id)
    }

    pub fn blacklist_token(jti: &str) -> String {
        format!("blacklist_token:{}", jti)
    }

    pub fn user_tokens(user_id: Uuid) -> String {
        format!("user_tokens:{}", user_id)
    }

    pub fn rate_limit(subject: &str) -> String {
        format!("rate_limit:{}", subject)
    }
}

/// Cache TTL policy: static catalog data lives a day, live game state only
/// seconds, session bookkeeping up to the JWT lifetime.
pub mod ttl {
    use std::time::Duration;

    pub const CATALOG: Duration = Duration::from_secs(24 * 60 * 60);
    pub const CHARACTER: Duration = Duration::from_secs(30);
    pub const INVENTORY: Duration = Duration::from_secs(30);
    pub const INVENTORY_ITEMS: Duration = Duration::from_secs(5 * 60);
    pub const ACTIVE_CHARACTERS: Duration = Duration::from_secs(30);
    pub const SURNAME: Duration = Duration::from_secs(5 * 60);
    pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
    pub const BLACKLIST: Duration = Duration::from_secs(60 * 60);
}

#[derive(Clone)]
pub struct CacheService {
    redis: RedisPool,
}

impl CacheService {
    pub fn new(redis: RedisPool) -> Self {
        Self { redis }
    }

    /// Read-through get. Any failure is a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let key = key.to_string();
        let result = self
            .redis
            .execute(|mut conn| {
                let key = key.clone();
                async move {
                    let value: Option<String> = conn.get(&key).await?;
                    Ok((value, conn))
                }
            })
            .await;

        match result {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Best-effort set; errors are logged, never returned.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cache serialization failed for {}: {}", key, e);
                return;
            }
        };

        let key = key.to_string();
        let result = self
            .redis
            .execute(|mut conn| {
                let key = key.clone();
                let raw = raw.clone();
                async move {
                    let _: () = conn.set_ex(&key, raw, ttl.as_secs()).await?;
                    Ok(((), conn))
                }
            })
            .await;

        if let Err(e) = result {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }

    /// Best-effort invalidation.
    pub async fn del(&self, key: &str) {
        let key = key.to_string();
        let result = self
            .redis
            .execute(|mut conn| {
                let key = key.clone();
                async move {
                    let _: () = conn.del(&key).await?;
                    Ok(((), conn))
                }
            })
            .await;

        if let Err(e) = result {
            warn!("Cache delete failed for {}: {}", key, e);
        }
    }

    /// Existence check used by the token blacklist. Unlike ordinary reads,
    /// the caller needs to distinguish "absent" from "Redis is down".
    pub async fn exists(&self, key: &str) -> Result<bool, redis::RedisError> {
        let key = key.to_string();
        self.redis
            .execute(|mut conn| {
                let key = key.clone();
                async move {
                    let exists: bool = conn.exists(&key).await?;
                    Ok((exists, conn))
                }
            })
            .await
    }

    pub async fn sadd(&self, key: &str, member: &str) -> Result<(), redis::RedisError> {
        let key = key.to_string();
        let member = member.to_string();
        self.redis
            .execute(|mut conn| {
                let key = key.clone();
                let member = member.clone();
                async move {
                    let _: () = conn.sadd(&key, &member).await?;
                    Ok(((), conn))
                }
            })
            .await
    }

    pub async fn smembers(&self, key: &str) -> Result<Vec<String>, redis::RedisError> {
        let key = key.to_string();
        self.redis
            .execute(|mut conn| {
                let key = key.clone();
                async move {
                    let members: Vec<String> = conn.smembers(&key).await?;
                    Ok((members, conn))
                }
            })
            .await
    }

    /// Pipelined blacklist fan-out: write every `blacklist_token:<jti>` with
    /// the given TTL, then drop the tracking set, in one round trip.
    pub async fn blacklist_tokens(
        &self,
        user_tokens_key: &str,
        jtis: &[String],
        ttl: Duration,
    ) -> Result<(), redis::RedisError> {
        let user_tokens_key = user_tokens_key.to_string();
        let jtis = jtis.to_vec();
        self.redis
            .execute(|mut conn| {
                let user_tokens_key = user_tokens_key.clone();
                let jtis = jtis.clone();
                async move {
                    let mut pipe = redis::pipe();
                    for jti in &jtis {
                        pipe.set_ex(cache_keys::blacklist_token(jti), "1", ttl.as_secs())
                            .ignore();
                    }
                    pipe.del(&user_tokens_key).ignore();
                    let _: () = pipe.query_async(&mut conn).await?;
                    Ok(((), conn))
                }
            })
            .await
    }

    /// Fixed-window counter: INCR and, on the first hit in the window, set
    /// the expiry. A Lua script keeps the pair atomic.
    pub async fn incr_fixed_window(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<i64, redis::RedisError> {
        let key = key.to_string();
        let window_secs = window.as_secs();
        self.redis
            .execute(|mut conn| {
                let key = key.clone();
                async move {
                    let script = redis::Script::new(
                        r#"
                        local count = redis.call('INCR', KEYS[1])
                        if count == 1 then
                            redis.call('EXPIRE', KEYS[1], ARGV[1])
                        end
                        return count
                    "#,
                    );
                    let count: i64 = script
                        .key(&key)
                        .arg(window_secs)
                        .invoke_async(&mut conn)
                        .await?;
                    Ok((count, conn))
                }
            })
            .await
    }

    /// Invalidate the cached character lookups (both key shapes) plus the
    /// active-character snapshot.
    pub async fn invalidate_character(&self, character_id: Uuid, name: &str) {
        self.del(&cache_keys::character_id(character_id)).await;
        self.del(&cache_keys::character_name(name)).await;
        self.del(&cache_keys::active_characters()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_formats_are_stable() {
        let uid = Uuid::nil();
        assert_eq!(cache_keys::action(1), "action:1");
        assert_eq!(cache_keys::action_name("IDLE"), "action:name:IDLE");
        assert_eq!(cache_keys::actions_all(), "actions:all");
        assert_eq!(cache_keys::item_name("WOOD"), "item:name:WOOD");
        assert_eq!(
            cache_keys::character_id(uid),
            format!("character:id:{}", uid)
        );
        assert_eq!(
            cache_keys::inventory_by_character(uid),
            format!("inventory:char:{}", uid)
        );
        assert_eq!(
            cache_keys::inventory_items(uid),
            format!("inventory_items:inv:{}", uid)
        );
        assert_eq!(cache_keys::resource_nodes_at(-3, 7), "resource_nodes:-3:7");
        assert_eq!(cache_keys::active_characters(), "active_characters");
        assert_eq!(
            cache_keys::blacklist_token("abc"),
            "blacklist_token:abc"
        );
        assert_eq!(
            cache_keys::user_tokens(uid),
            format!("user_tokens:{}", uid)
        );
        assert_eq!(cache_keys::rate_limit("unauth"), "rate_limit:unauth");
    }

    #[test]
    fn ttl_policy() {
        assert_eq!(ttl::CATALOG.as_secs(), 86400);
        assert_eq!(ttl::CHARACTER.as_secs(), 30);
        assert_eq!(ttl::INVENTORY_ITEMS.as_secs(), 300);
        assert_eq!(ttl::SURNAME.as_secs(), 300);
        assert_eq!(ttl::RATE_LIMIT_WINDOW.as_secs(), 60);
        assert_eq!(ttl::BLACKLIST.as_secs(), 3600);
    }
}
