//! Shared lock-state cache
//!
//! ## Responsibilities
//!
//! - Atomic per-key operations for the camera lock records
//! - Atomic list operations for the per-camera waiting lists
//!
//! All lock state lives in a process-external cache shared by every server
//! instance. The coordinator never treats this as a local data structure:
//! each operation here is a single round trip, and no cross-key transaction
//! is assumed anywhere.
//!
//! The backend is injected as a trait so services can run against the
//! in-process implementation in tests and single-instance deployments.

mod memory;
mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

use crate::error::Result;
use std::time::Duration;

/// Atomic key/list operations over the shared cache.
#[async_trait::async_trait]
pub trait UsageCache: Send + Sync {
    /// Read a single value. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Unconditionally write a value with a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Write a value with a TTL only if the key is absent (or expired).
    /// Returns true when this caller's write won.
    async fn set_if_vacant(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Full contents of a list, in insertion order. Absent list reads empty.
    async fn list_range(&self, key: &str) -> Result<Vec<String>>;

    /// Append a value to a list unless it is already present.
    /// Returns the resulting list length. Membership check and push are two
    /// round trips; duplicate suppression is best effort under concurrency.
    async fn list_push_if_absent(&self, key: &str, value: &str) -> Result<usize>;

    /// Remove every occurrence of a value from a list.
    async fn list_remove(&self, key: &str, value: &str) -> Result<()>;

    /// Drop an entire list.
    async fn list_clear(&self, key: &str) -> Result<()>;
}
