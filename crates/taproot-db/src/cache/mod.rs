//! Two-tier query-result caching.
//!
//! Results are cached under a key derived from the compiled SQL and its
//! bound values, and registered against every table named by the query's
//! `from` fragment so that mutations can invalidate them wholesale.
//!
//! Two tiers:
//!
//! 1. an optional external [`CacheDriver`] — consulted only for queries
//!    that opted in via `cached()`, and only when a driver is configured;
//! 2. a session-local in-memory map — always populated, always consulted
//!    as the fallback.
//!
//! A result is written to exactly one tier, never both, and never promoted
//! between tiers. Invalidation always hits both tiers; over-invalidation
//! is fine, under-invalidation is not. Driver failures degrade to a miss.

pub mod driver;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::row::Row;
use crate::value::Value;

pub use driver::{CacheDriver, MemoryDriver};

const DATA_PREFIX: &str = "orm_data_";
const KEYS_PREFIX: &str = "orm_keys_";

/// A cached query result: whatever shape the terminal operation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CachedResult {
    /// A full result set (`find_all`).
    Rows(Vec<Row>),
    /// At most one row (`find_one`).
    Row(Option<Row>),
    /// A single scalar (`count`).
    Cell(Value),
}

/// The two-tier cache owned by a session.
pub struct QueryCache {
    driver: Option<Arc<dyn CacheDriver>>,
    data: HashMap<String, CachedResult>,
    tables: HashMap<String, Vec<String>>,
}

impl QueryCache {
    /// Creates a cache, optionally attached to an external driver.
    pub fn new(driver: Option<Arc<dyn CacheDriver>>) -> Self {
        Self {
            driver,
            data: HashMap::new(),
            tables: HashMap::new(),
        }
    }

    /// Returns `true` if an external driver is configured.
    pub const fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Derives the cache key for a compiled statement.
    ///
    /// Two independent hashes, one over the SQL shape and one over the
    /// serialized values, concatenated. Collisions on either side stay
    /// observable on their own, which helps when debugging cache contents.
    pub fn cache_key(sql: &str, params: &[Value]) -> String {
        let sql_hash = seahash::hash(sql.as_bytes());
        let serialized = serde_json::to_string(params).unwrap_or_default();
        let values_hash = seahash::hash(serialized.as_bytes());
        format!("{DATA_PREFIX}{sql_hash}_{values_hash}")
    }

    /// Looks up a cached result.
    ///
    /// The external tier is consulted first when `use_external` is set and
    /// a driver is configured; the in-memory tier is the fallback either
    /// way. Returns `None` on a miss in both tiers.
    pub async fn lookup(&self, key: &str, use_external: bool) -> Option<CachedResult> {
        if use_external {
            if let Some(driver) = &self.driver {
                match driver.get(key).await {
                    Ok(Some(raw)) => match serde_json::from_value(raw) {
                        Ok(result) => return Some(result),
                        Err(e) => {
                            tracing::warn!(key, error = %e, "discarding undecodable cache entry");
                        }
                    },
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(key, error = %e, "cache driver get failed, treating as miss");
                    }
                }
            }
        }

        self.data.get(key).cloned()
    }

    /// Stores a result under `key`, registered against every table named
    /// by `owner_tables` (a `from` fragment, possibly comma-separated).
    ///
    /// Writes to the external tier when `use_external` is set and a driver
    /// is configured; otherwise to the in-memory tier. Never both.
    pub async fn store(
        &mut self,
        key: &str,
        owner_tables: &str,
        result: CachedResult,
        use_external: bool,
    ) {
        if use_external {
            if let Some(driver) = self.driver.clone() {
                self.store_external(driver.as_ref(), key, owner_tables, &result)
                    .await;
                return;
            }
            tracing::debug!("caching requested without a driver, using in-memory tier");
        }

        for table in split_tables(owner_tables) {
            let keys = self.tables.entry(table).or_default();
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        self.data.insert(key.to_string(), result);
    }

    async fn store_external(
        &self,
        driver: &dyn CacheDriver,
        key: &str,
        owner_tables: &str,
        result: &CachedResult,
    ) {
        let Ok(raw) = serde_json::to_value(result) else {
            return;
        };
        if let Err(e) = driver.set(key, raw).await {
            tracing::warn!(key, error = %e, "cache driver set failed, result not cached");
            return;
        }

        // register the key under every owner table's key list
        for table in split_tables(owner_tables) {
            let table_key = format!("{KEYS_PREFIX}{table}");
            let mut keys: Vec<String> = match driver.get(&table_key).await {
                Ok(Some(raw)) => serde_json::from_value(raw).unwrap_or_default(),
                _ => Vec::new(),
            };
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
            if let Ok(raw) = serde_json::to_value(&keys) {
                if let Err(e) = driver.set(&table_key, raw).await {
                    tracing::warn!(table_key = %table_key, error = %e, "cache driver set failed for key list");
                }
            }
        }
    }

    /// Drops every cached result registered against `table`, in both tiers.
    pub async fn invalidate_table(&mut self, table: &str) {
        for table in split_tables(table) {
            if let Some(keys) = self.tables.remove(&table) {
                for key in keys {
                    self.data.remove(&key);
                }
            }

            if let Some(driver) = &self.driver {
                let table_key = format!("{KEYS_PREFIX}{table}");
                match driver.get(&table_key).await {
                    Ok(Some(raw)) => {
                        let keys: Vec<String> = serde_json::from_value(raw).unwrap_or_default();
                        for key in keys {
                            if let Err(e) = driver.delete(&key).await {
                                tracing::warn!(key = %key, error = %e, "cache driver delete failed");
                            }
                        }
                        if let Err(e) = driver.delete(&table_key).await {
                            tracing::warn!(table_key = %table_key, error = %e, "cache driver delete failed");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(table_key = %table_key, error = %e, "cache driver get failed during invalidation");
                    }
                }
            }
        }
    }
}

/// Splits a `from` fragment into normalized owner-table names.
fn split_tables(fragment: &str) -> Vec<String> {
    fragment
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
