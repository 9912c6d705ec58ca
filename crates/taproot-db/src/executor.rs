//! The database execution interface.
//!
//! [`DbExecutor`] is the minimal async surface the query layer needs from a
//! concrete database: run a statement, fetch rows, report affected counts,
//! hand back the last inserted id, and drive transactions. Backends
//! implement it in `taproot-db-backends`; tests implement it with the
//! scripted double in [`testing`](crate::testing).
//!
//! The executor is a shared, externally-owned resource: the query layer
//! never opens or closes connections, and transactions are entirely
//! caller-driven.

use async_trait::async_trait;

use taproot_core::OrmResult;

use crate::row::Row;
use crate::value::Value;

/// Minimal async database executor.
#[async_trait]
pub trait DbExecutor: Send + Sync {
    /// Runs a query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>>;

    /// Runs a statement that returns no rows; returns the affected-row count.
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64>;

    /// Returns the row id generated by the most recent insert.
    async fn last_insert_id(&self) -> OrmResult<Value>;

    /// Runs a query and returns the first row, if any.
    async fn query_row(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Row>> {
        let rows = self.query(sql, params).await?;
        Ok(rows.into_iter().next())
    }

    /// Runs a query and returns the first column of the first row.
    ///
    /// Returns [`Value::Null`] when the query produces no rows.
    async fn query_cell(&self, sql: &str, params: &[Value]) -> OrmResult<Value> {
        let row = self.query_row(sql, params).await?;
        Ok(row
            .and_then(|r| {
                let (_, values) = r.into_parts();
                values.into_iter().next()
            })
            .unwrap_or(Value::Null))
    }

    /// Opens a transaction.
    async fn begin(&self) -> OrmResult<()> {
        self.execute("begin", &[]).await.map(|_| ())
    }

    /// Commits the open transaction.
    async fn commit(&self) -> OrmResult<()> {
        self.execute("commit", &[]).await.map(|_| ())
    }

    /// Rolls back the open transaction.
    async fn rollback(&self) -> OrmResult<()> {
        self.execute("rollback", &[]).await.map(|_| ())
    }
}
