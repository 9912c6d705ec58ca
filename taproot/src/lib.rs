//! # taproot
//!
//! A lightweight ORM core: a fluent SQL builder with deterministic
//! compilation, dynamic entity records, and a two-tier query cache.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on
//! `taproot` for the whole stack, or on the individual crates for
//! finer-grained control.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use taproot::db::{Session, Value};
//! use taproot::db_backends::SqliteBackend;
//!
//! # async fn run() -> taproot::core::OrmResult<()> {
//! let backend = SqliteBackend::memory()?;
//! let session = Session::new(Arc::new(backend));
//!
//! let mut user = session.collection("users").create();
//! user.set("name", "Alice");
//! user.store(&session).await?;
//!
//! let adults = session
//!     .collection("users")
//!     .query()
//!     .where_("age >= ?", vec![Value::Int(18)])
//!     .cached()
//!     .find_all()
//!     .await?;
//! # let _ = adults;
//! # Ok(())
//! # }
//! ```

/// Error taxonomy, settings, and logging bootstrap.
pub use taproot_core as core;

/// ORM core: builder, compiler, entities, and the query cache.
pub use taproot_db as db;

/// Database backends: SQLite.
pub use taproot_db_backends as db_backends;
