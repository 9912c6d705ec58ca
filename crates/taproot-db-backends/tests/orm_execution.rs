//! Integration tests for the full ORM pipeline.
//!
//! These run the builder, entity and cache layers against a real in-memory
//! SQLite database: clause accumulation through compilation, execution,
//! materialization, and table-scoped cache invalidation.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use taproot_core::OrmError;
use taproot_db::cache::MemoryDriver;
use taproot_db::executor::DbExecutor;
use taproot_db::session::Session;
use taproot_db::value::Value;
use taproot_db_backends::SqliteBackend;

async fn session() -> Session {
    let db = SqliteBackend::memory().unwrap();
    db.execute(
        "create table session (id integer primary key, token text, user_id integer)",
        &[],
    )
    .await
    .unwrap();
    db.execute(
        "create table users (id integer primary key, name text, age integer)",
        &[],
    )
    .await
    .unwrap();
    Session::new(Arc::new(db))
}

// ── The session-token scenario ─────────────────────────────────────────

#[tokio::test]
async fn test_find_one_by_token_scenario() {
    let session = session().await;

    // empty table: absent
    let found = session
        .collection("session")
        .query()
        .where_("token = ?", vec![Value::from("abc123")])
        .find_one()
        .await
        .unwrap();
    assert!(found.is_none());

    // insert a row through the entity layer
    let collection = session.collection("session");
    let mut record = collection.create();
    record.set("token", "abc123");
    record.set("user_id", 42_i64);
    let id = record.store(&session).await.unwrap();
    assert!(record.loaded());

    // the same query now returns the row, fully populated
    let found = session
        .collection("session")
        .query()
        .where_("token = ?", vec![Value::from("abc123")])
        .find_one()
        .await
        .unwrap()
        .expect("row should exist after insert");
    assert_eq!(found.id(), Some(id));
    assert_eq!(found.get("token"), Some(&Value::String("abc123".into())));
    assert_eq!(found.get("user_id"), Some(&Value::Int(42)));
}

// ── Builder terminals against real SQL ─────────────────────────────────

#[tokio::test]
async fn test_find_all_ordering_and_pagination() {
    let session = session().await;
    for (name, age) in [("Alice", 30), ("Bob", 25), ("Carol", 35), ("Dave", 28)] {
        let mut user = session.collection("users").create();
        user.set("name", name);
        user.set("age", i64::from(age));
        user.store(&session).await.unwrap();
    }

    let pager = taproot_db::Pagination::new(2, 2).unwrap();
    let result = session
        .collection("users")
        .query()
        .order("age")
        .paginate(&pager)
        .find_all()
        .await
        .unwrap();

    let names: Vec<String> = result
        .values()
        .map(|e| e.get("name").unwrap().as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Alice", "Carol"]);
}

#[tokio::test]
async fn test_count_and_update_affected_rows() {
    let session = session().await;
    for (name, age) in [("Alice", 30), ("Bob", 17)] {
        let mut user = session.collection("users").create();
        user.set("name", name);
        user.set("age", i64::from(age));
        user.store(&session).await.unwrap();
    }

    assert_eq!(session.collection("users").count().await.unwrap(), 2);

    let adults = session
        .collection("users")
        .query()
        .where_("age >= ?", vec![Value::Int(18)])
        .count()
        .await
        .unwrap();
    assert_eq!(adults, 1);

    let affected = session
        .collection("users")
        .query()
        .where_("age < ?", vec![Value::Int(18)])
        .update(vec![("age".to_string(), Value::Int(18))])
        .await
        .unwrap();
    assert_eq!(affected, 1);
}

#[tokio::test]
async fn test_where_accumulation_ands_predicates() {
    let session = session().await;
    for (name, age) in [("Alice", 30), ("Alice", 20), ("Bob", 30)] {
        let mut user = session.collection("users").create();
        user.set("name", name);
        user.set("age", i64::from(age));
        user.store(&session).await.unwrap();
    }

    let result = session
        .collection("users")
        .query()
        .where_("name = ?", vec![Value::from("Alice")])
        .where_("age = ?", vec![Value::Int(30)])
        .find_all()
        .await
        .unwrap();
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn test_delete_via_builder() {
    let session = session().await;
    let mut user = session.collection("users").create();
    user.set("name", "Alice");
    let id = user.store(&session).await.unwrap();

    let affected = session
        .collection("users")
        .query()
        .where_("id = ?", vec![Value::Int(id)])
        .delete()
        .await
        .unwrap();
    assert_eq!(affected, 1);
    assert_eq!(session.collection("users").count().await.unwrap(), 0);
}

// ── Entity lifecycle ───────────────────────────────────────────────────

#[tokio::test]
async fn test_entity_update_and_reload() {
    let session = session().await;
    let mut user = session.collection("users").create();
    user.set("name", "Alice");
    user.set("age", 30_i64);
    let id = user.store(&session).await.unwrap();

    user.set("age", 31_i64);
    assert!(user.modified());
    user.store(&session).await.unwrap();
    assert!(!user.modified());

    let mut fresh = session.collection("users").load(id).await.unwrap().unwrap();
    assert_eq!(fresh.get("age"), Some(&Value::Int(31)));

    // reload picks up out-of-band changes
    session
        .db()
        .execute("update users set age = 99 where id = ?", &[Value::Int(id)])
        .await
        .unwrap();
    assert!(fresh.reload(&session).await.unwrap());
    assert_eq!(fresh.get("age"), Some(&Value::Int(99)));
}

#[tokio::test]
async fn test_entity_delete_clears_state() {
    let session = session().await;
    let mut user = session.collection("users").create();
    user.set("name", "Alice");
    user.store(&session).await.unwrap();

    let affected = user.delete(&session).await.unwrap();
    assert_eq!(affected, 1);
    assert!(!user.loaded());
    assert_eq!(user.id(), None);
    assert!(!user.reload(&session).await.unwrap());
}

// ── Caching against a live database ────────────────────────────────────

#[tokio::test]
async fn test_session_cache_serves_stale_data_until_invalidated() {
    let session = session().await;
    let mut user = session.collection("users").create();
    user.set("name", "Alice");
    let id = user.store(&session).await.unwrap();

    // prime the in-memory tier
    let primed = session.collection("users").query().find_all().await.unwrap();
    assert_eq!(primed.len(), 1);

    // mutate behind the cache's back: raw executor calls bypass invalidation
    session
        .db()
        .execute("delete from users where id = ?", &[Value::Int(id)])
        .await
        .unwrap();

    // the cached result set is still served
    let cached = session.collection("users").query().find_all().await.unwrap();
    assert_eq!(cached.len(), 1);

    // a builder-level mutation invalidates, and the truth comes back
    session
        .collection("users")
        .query()
        .where_("id = ?", vec![Value::Int(-1)])
        .delete()
        .await
        .unwrap();
    let fresh = session.collection("users").query().find_all().await.unwrap();
    assert!(fresh.is_empty());
}

#[tokio::test]
async fn test_external_cache_round_trip_and_invalidation() {
    let db = SqliteBackend::memory().unwrap();
    db.execute(
        "create table users (id integer primary key, name text, age integer)",
        &[],
    )
    .await
    .unwrap();
    let driver = Arc::new(MemoryDriver::new());
    let session = Session::with_cache_driver(Arc::new(db), driver.clone());

    let mut user = session.collection("users").create();
    user.set("name", "Alice");
    user.store(&session).await.unwrap();

    let first = session
        .collection("users")
        .query()
        .cached()
        .find_all()
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    assert!(!driver.is_empty());

    // cached() round trip returns an equal result
    let second = session
        .collection("users")
        .query()
        .cached()
        .find_all()
        .await
        .unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(
        second.values().next().unwrap().get("name"),
        first.values().next().unwrap().get("name")
    );

    // a mutation clears the external tier for that table
    session
        .collection("users")
        .query()
        .where_("name = ?", vec![Value::from("Alice")])
        .update(vec![("age".to_string(), Value::Int(31))])
        .await
        .unwrap();
    assert!(driver.is_empty());

    let after = session
        .collection("users")
        .query()
        .cached()
        .find_all()
        .await
        .unwrap();
    assert_eq!(
        after.values().next().unwrap().get("age"),
        Some(&Value::Int(31))
    );
}

// ── Transactions ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_rollback_discards_changes() {
    let session = session().await;

    session.begin().await.unwrap();
    let mut user = session.collection("users").create();
    user.set("name", "Alice");
    user.store(&session).await.unwrap();
    session.rollback().await.unwrap();

    assert_eq!(session.collection("users").count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_commit_keeps_changes() {
    let session = session().await;

    session.begin().await.unwrap();
    let mut user = session.collection("users").create();
    user.set("name", "Alice");
    user.store(&session).await.unwrap();
    session.commit().await.unwrap();

    assert_eq!(session.collection("users").count().await.unwrap(), 1);
}

// ── Error propagation ──────────────────────────────────────────────────

#[tokio::test]
async fn test_constraint_violation_propagates() {
    let session = session().await;
    session
        .db()
        .execute("create unique index users_name on users (name)", &[])
        .await
        .unwrap();

    let mut first = session.collection("users").create();
    first.set("name", "Alice");
    first.store(&session).await.unwrap();

    let mut dupe = session.collection("users").create();
    dupe.set("name", "Alice");
    let err = dupe.store(&session).await.unwrap_err();
    assert!(matches!(err, OrmError::ExecutionFailed(_)));
}

#[tokio::test]
async fn test_malformed_builder_fails_without_touching_db() {
    let session = session().await;
    // order() alone has nothing to attach to
    let err = session
        .collection("users")
        .query()
        .reset()
        .order("name")
        .find_all()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::MissingTable));
}
