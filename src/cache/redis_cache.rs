//! Redis-backed cache

use super::UsageCache;
use crate::error::Result;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

/// Redis implementation of [`UsageCache`].
///
/// Uses a multiplexed connection; clones are cheap and share the underlying
/// socket. Key TTLs ride on Redis expiry (`SET .. PX`), so an expired holder
/// key is gone by the time anyone reads it.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// Connect to the Redis instance at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!("Redis cache connected");
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl UsageCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn set_if_vacant(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        // SET NX PX is a single atomic command; nil reply means another
        // holder's live record is in place.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn list_range(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.lrange(key, 0, -1).await?)
    }

    async fn list_push_if_absent(&self, key: &str, value: &str) -> Result<usize> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.lrange(key, 0, -1).await?;
        if !members.iter().any(|m| m == value) {
            let _: () = conn.rpush(key, value).await?;
        }
        let len: usize = conn.llen(key).await?;
        Ok(len)
    }

    async fn list_remove(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.lrem(key, 0, value).await?;
        Ok(())
    }

    async fn list_clear(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
