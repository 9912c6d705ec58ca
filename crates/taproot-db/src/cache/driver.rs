//! Pluggable external cache drivers.
//!
//! A [`CacheDriver`] is a shared, externally-owned store (memcached, redis,
//! APC-style process caches). The query cache only ever hands it
//! `serde_json::Value`s, so drivers stay oblivious to ORM types. Driver
//! failures are an optimization loss, not an error: the query cache treats
//! them as misses.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use taproot_core::OrmResult;

/// A key/value store usable as the external cache tier.
#[async_trait]
pub trait CacheDriver: Send + Sync {
    /// Fetches the value stored under `key`, if any.
    async fn get(&self, key: &str) -> OrmResult<Option<serde_json::Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: serde_json::Value) -> OrmResult<()>;

    /// Removes the value stored under `key`. Removing a missing key is not
    /// an error.
    async fn delete(&self, key: &str) -> OrmResult<()>;
}

/// A process-local [`CacheDriver`] backed by a `HashMap`.
///
/// Stands in for an out-of-process store in tests and single-process
/// deployments.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryDriver {
    /// Creates an empty driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheDriver for MemoryDriver {
    async fn get(&self, key: &str) -> OrmResult<Option<serde_json::Value>> {
        Ok(self
            .entries
            .lock()
            .expect("cache mutex poisoned")
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> OrmResult<()> {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> OrmResult<()> {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .remove(key);
        Ok(())
    }
}
