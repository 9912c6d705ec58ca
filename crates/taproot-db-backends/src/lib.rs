//! # taproot-db-backends
//!
//! Concrete [`DbExecutor`](taproot_db::executor::DbExecutor) implementations.
//! Currently SQLite via `rusqlite`, behind the `sqlite` feature (on by
//! default).

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
