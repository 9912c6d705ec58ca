//! The per-request ORM context.
//!
//! A [`Session`] carries the two externally-owned collaborators — the
//! database executor and, optionally, an external cache driver — plus the
//! session-local in-memory cache tier. Everything that used to be a hidden
//! global in older designs is injected here explicitly, which is also what
//! makes the one-session-per-request model enforceable.

use std::sync::Arc;

use tokio::sync::Mutex;

use taproot_core::{OrmError, OrmResult};

use crate::cache::{CacheDriver, CachedResult, QueryCache};
use crate::collection::Collection;
use crate::executor::DbExecutor;

/// An ORM session: database handle, cache, and collection factory.
///
/// Sessions are cheap to construct and intended to live for one request.
/// The in-memory cache tier dies with the session; the executor and the
/// external driver outlive it.
pub struct Session {
    db: Arc<dyn DbExecutor>,
    cache: Mutex<QueryCache>,
    has_driver: bool,
}

impl Session {
    /// Creates a session without an external cache driver.
    ///
    /// Queries that call `cached()` will degrade to the in-memory tier.
    pub fn new(db: Arc<dyn DbExecutor>) -> Self {
        Self {
            db,
            cache: Mutex::new(QueryCache::new(None)),
            has_driver: false,
        }
    }

    /// Creates a session with an external cache driver attached.
    pub fn with_cache_driver(db: Arc<dyn DbExecutor>, driver: Arc<dyn CacheDriver>) -> Self {
        Self {
            db,
            cache: Mutex::new(QueryCache::new(Some(driver))),
            has_driver: true,
        }
    }

    /// Returns the database executor.
    pub fn db(&self) -> &dyn DbExecutor {
        self.db.as_ref()
    }

    /// Returns `Ok` if an external cache driver is configured.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::CacheUnavailable`] otherwise. Query execution
    /// never calls this; it degrades silently instead.
    pub fn require_cache_driver(&self) -> OrmResult<()> {
        if self.has_driver {
            Ok(())
        } else {
            Err(OrmError::CacheUnavailable)
        }
    }

    /// Returns a collection rooted at the given table.
    pub fn collection(&self, name: &str) -> Collection<'_> {
        Collection::new(self, name)
    }

    /// Opens a transaction on the underlying executor.
    pub async fn begin(&self) -> OrmResult<()> {
        self.db.begin().await
    }

    /// Commits the open transaction.
    pub async fn commit(&self) -> OrmResult<()> {
        self.db.commit().await
    }

    /// Rolls back the open transaction.
    pub async fn rollback(&self) -> OrmResult<()> {
        self.db.rollback().await
    }

    /// Drops every cached query result registered against `table`, in both
    /// cache tiers. Called by every mutating operation; callers running raw
    /// SQL through the executor can use it too.
    pub async fn invalidate_table(&self, table: &str) {
        self.cache.lock().await.invalidate_table(table).await;
    }

    pub(crate) async fn cache_lookup(&self, key: &str, use_external: bool) -> Option<CachedResult> {
        self.cache.lock().await.lookup(key, use_external).await
    }

    pub(crate) async fn cache_store(
        &self,
        key: &str,
        owner_tables: &str,
        result: CachedResult,
        use_external: bool,
    ) {
        self.cache
            .lock()
            .await
            .store(key, owner_tables, result, use_external)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryDriver;
    use crate::testing::MockExecutor;

    #[tokio::test]
    async fn test_require_cache_driver() {
        let plain = Session::new(Arc::new(MockExecutor::new()));
        assert!(matches!(
            plain.require_cache_driver(),
            Err(OrmError::CacheUnavailable)
        ));

        let cached = Session::with_cache_driver(
            Arc::new(MockExecutor::new()),
            Arc::new(MemoryDriver::new()),
        );
        assert!(cached.require_cache_driver().is_ok());
    }

    #[tokio::test]
    async fn test_transaction_passthrough() {
        let db = Arc::new(MockExecutor::new());
        let session = Session::new(db.clone());
        session.begin().await.unwrap();
        session.commit().await.unwrap();
        session.rollback().await.unwrap();
        let log = db.statements();
        assert_eq!(log, vec!["begin", "commit", "rollback"]);
    }
}
