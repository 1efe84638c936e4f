use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// TTL for cached fact reads (seconds). Short on purpose: access facts are
/// mutated from several places and stale grants are worse than extra reads.
pub const FACT_CACHE_TTL: usize = 300;

/// The GET paths whose responses make up the cached access-fact set. A
/// mutation that changes access must clear all of them together, never a
/// subset, so a caller can never observe a stale mix of facts.
pub const PREMIUM_FACT_PATHS: [&str; 3] = [
    "/api/premium/subscription",
    "/api/premium/status",
    "/api/users/me",
];

pub struct CacheHelper;

impl CacheHelper {
    pub async fn get<T: DeserializeOwned>(
        redis: &Arc<ConnectionManager>,
        key: &str,
    ) -> Result<Option<T>, redis::RedisError> {
        let mut redis = ConnectionManager::clone(redis);
        let cached: Result<String, redis::RedisError> = redis.get(key).await;

        match cached {
            Ok(data) => {
                if let Ok(value) = serde_json::from_str::<T>(&data) {
                    tracing::debug!("Cache HIT: {}", key);
                    Ok(Some(value))
                } else {
                    tracing::warn!("Cache deserialization failed for: {}", key);
                    Ok(None)
                }
            }
            Err(_) => {
                tracing::debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    pub async fn set<T: Serialize>(
        redis: &Arc<ConnectionManager>,
        key: &str,
        value: &T,
        ttl_seconds: usize,
    ) -> Result<(), redis::RedisError> {
        if let Ok(json) = serde_json::to_string(value) {
            let mut conn = ConnectionManager::clone(redis);
            let _: () = conn.set_ex(key, json, ttl_seconds).await?;
            tracing::debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds);
        }
        Ok(())
    }

    pub async fn delete(
        redis: &Arc<ConnectionManager>,
        key: &str,
    ) -> Result<(), redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        let _: () = redis::AsyncCommands::del(&mut conn, key).await?;
        tracing::debug!("Cache DELETE: {}", key);
        Ok(())
    }

    /// Delete keys matching a pattern using SCAN (non-blocking).
    pub async fn delete_pattern(
        redis: &Arc<ConnectionManager>,
        pattern: &str,
    ) -> Result<(), redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        let mut cursor: u64 = 0;
        let mut deleted_count = 0;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                deleted_count += keys.len();
                let _: () = redis::AsyncCommands::del(&mut conn, &keys).await?;
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        tracing::debug!(
            "Cache DELETE pattern: {} ({} keys deleted)",
            pattern,
            deleted_count
        );
        Ok(())
    }

    /// Invalidate every cached access fact as a set.
    ///
    /// `user_tag` scopes the wipe to one user's cache entries. Admin-side
    /// mutations (grant, revoke) pass `None` and clear the fact paths for
    /// all users, since the admin's request carries no target user tag.
    pub async fn invalidate_premium_facts(
        redis: &Arc<ConnectionManager>,
        user_tag: Option<&str>,
    ) -> Result<(), redis::RedisError> {
        for path in PREMIUM_FACT_PATHS {
            let pattern = match user_tag {
                Some(tag) => format!("cache:GET:{}:{}", path, tag),
                None => format!("cache:GET:{}:*", path),
            };
            Self::delete_pattern(redis, &pattern).await?;
        }
        tracing::debug!(
            "Invalidated premium fact set for {}",
            user_tag.unwrap_or("all users")
        );
        Ok(())
    }

    pub async fn health_check(
        redis: &Arc<ConnectionManager>,
    ) -> Result<bool, redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(response == "PONG")
    }
}
