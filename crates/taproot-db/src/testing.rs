//! Test doubles for the execution interface.
//!
//! [`MockExecutor`] is a scripted [`DbExecutor`]: queued result sets are
//! served in order, every attempted statement is logged, and the next call
//! can be made to fail on demand. Cache tests lean on the statement log to
//! assert "exactly one database execution" properties.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use taproot_core::{OrmError, OrmResult};

use crate::executor::DbExecutor;
use crate::row::Row;
use crate::value::Value;

/// A scripted database executor for tests.
#[derive(Debug)]
pub struct MockExecutor {
    responses: Mutex<VecDeque<Vec<Row>>>,
    log: Mutex<Vec<(String, Vec<Value>)>>,
    affected: Mutex<u64>,
    next_insert_id: Mutex<i64>,
    fail_next: Mutex<Option<String>>,
}

impl MockExecutor {
    /// Creates an executor with no queued responses, an affected count of 1
    /// and a first insert id of 1.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            log: Mutex::new(Vec::new()),
            affected: Mutex::new(1),
            next_insert_id: Mutex::new(1),
            fail_next: Mutex::new(None),
        }
    }

    /// Queues a result set; each `query` call consumes one.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.responses.lock().expect("mock poisoned").push_back(rows);
    }

    /// Sets the affected-row count returned by `execute`.
    pub fn set_affected(&self, n: u64) {
        *self.affected.lock().expect("mock poisoned") = n;
    }

    /// Sets the id returned by the next `last_insert_id` call.
    pub fn set_insert_id(&self, id: i64) {
        *self.next_insert_id.lock().expect("mock poisoned") = id;
    }

    /// Makes the next `query`/`execute` call fail with the given message.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.fail_next.lock().expect("mock poisoned") = Some(message.into());
    }

    /// Returns every statement run so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.log
            .lock()
            .expect("mock poisoned")
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// Returns the parameters bound to the `n`-th statement.
    pub fn params_of(&self, n: usize) -> Vec<Value> {
        self.log.lock().expect("mock poisoned")[n].1.clone()
    }

    fn record(&self, sql: &str, params: &[Value]) -> OrmResult<()> {
        self.log
            .lock()
            .expect("mock poisoned")
            .push((sql.to_string(), params.to_vec()));
        if let Some(message) = self.fail_next.lock().expect("mock poisoned").take() {
            return Err(OrmError::ExecutionFailed(message));
        }
        Ok(())
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DbExecutor for MockExecutor {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.record(sql, params)?;
        Ok(self
            .responses
            .lock()
            .expect("mock poisoned")
            .pop_front()
            .unwrap_or_default())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.record(sql, params)?;
        Ok(*self.affected.lock().expect("mock poisoned"))
    }

    async fn last_insert_id(&self) -> OrmResult<Value> {
        let mut id = self.next_insert_id.lock().expect("mock poisoned");
        let current = *id;
        *id += 1;
        Ok(Value::Int(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_rows_are_served_in_order() {
        let db = MockExecutor::new();
        db.push_rows(vec![Row::new(vec!["n".into()], vec![Value::Int(1)])]);
        db.push_rows(vec![Row::new(vec!["n".into()], vec![Value::Int(2)])]);

        let first = db.query("select 1", &[]).await.unwrap();
        let second = db.query("select 2", &[]).await.unwrap();
        assert_eq!(first[0].get::<i64>("n").unwrap(), 1);
        assert_eq!(second[0].get::<i64>("n").unwrap(), 2);
        assert!(db.query("select 3", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_statement_log_and_params() {
        let db = MockExecutor::new();
        db.execute("delete from t where id = ?", &[Value::Int(4)])
            .await
            .unwrap();
        assert_eq!(db.statements(), vec!["delete from t where id = ?"]);
        assert_eq!(db.params_of(0), vec![Value::Int(4)]);
    }

    #[tokio::test]
    async fn test_fail_next_fails_once() {
        let db = MockExecutor::new();
        db.fail_next("boom");
        assert!(db.query("select 1", &[]).await.is_err());
        assert!(db.query("select 1", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_insert_ids_increment() {
        let db = MockExecutor::new();
        assert_eq!(db.last_insert_id().await.unwrap(), Value::Int(1));
        assert_eq!(db.last_insert_id().await.unwrap(), Value::Int(2));
    }
}
