//! In-process cache
//!
//! Fallback backend for single-instance deployments (no REDIS_URL) and the
//! stand-in used by tests. Entry deadlines are checked on every read so the
//! expiry semantics match the Redis backend.

use super::UsageCache;
use crate::error::Result;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory implementation of [`UsageCache`].
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    lists: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UsageCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn set_if_vacant(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        // Single write-lock section: check-and-set is atomic here the same
        // way SET NX is on Redis. An expired entry counts as vacant.
        let mut entries = self.entries.write().await;
        if entries.get(key).map(|e| !e.is_expired()).unwrap_or(false) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list_range(&self, key: &str) -> Result<Vec<String>> {
        let lists = self.lists.read().await;
        Ok(lists.get(key).cloned().unwrap_or_default())
    }

    async fn list_push_if_absent(&self, key: &str, value: &str) -> Result<usize> {
        let mut lists = self.lists.write().await;
        let list = lists.entry(key.to_string()).or_default();
        if !list.iter().any(|m| m == value) {
            list.push(value.to_string());
        }
        Ok(list.len())
    }

    async fn list_remove(&self, key: &str, value: &str) -> Result<()> {
        let mut lists = self.lists.write().await;
        if let Some(list) = lists.get_mut(key) {
            list.retain(|m| m != value);
        }
        Ok(())
    }

    async fn list_clear(&self, key: &str) -> Result<()> {
        self.lists.write().await.remove(key);
        Ok(())
    }
}
