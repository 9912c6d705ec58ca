//! Error types shared across the taproot crates.
//!
//! [`OrmError`] is the single error enum used by the query builder, the cache
//! layer and the database backends. Compilation errors (`MissingTable`,
//! `MissingSelectOrDelete`) indicate malformed builder usage and are raised
//! before any I/O; execution errors carry whatever the backend reported.

use thiserror::Error;

/// The error type for all taproot operations.
#[derive(Error, Debug)]
pub enum OrmError {
    /// A clause that requires a `table` entry (`where`, `order`, `limit`,
    /// `offset`, `update`) was compiled without one present.
    #[error("error in query: table name is missing")]
    MissingTable,

    /// A `table` entry was compiled without a preceding `select`, `update`
    /// or `delete` entry.
    #[error("error in query: select, update or delete statement is missing")]
    MissingSelectOrDelete,

    /// The database collaborator failed while running a statement.
    /// Carries the backend's message unmodified.
    #[error("statement execution failed: {0}")]
    ExecutionFailed(String),

    /// The database collaborator failed outside statement execution
    /// (opening a connection, setting pragmas).
    #[error("operational error: {0}")]
    OperationalError(String),

    /// An external cache driver was requested but none is configured.
    ///
    /// Query execution never raises this: a builder that asked for caching
    /// without a driver silently degrades to the in-process tier. The
    /// variant exists for callers that interrogate the session directly.
    #[error("external cache driver is not configured")]
    CacheUnavailable,

    /// A row value could not be converted to the requested Rust type.
    #[error("value conversion failed: {0}")]
    ConversionError(String),

    /// Settings could not be loaded or validated.
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

impl OrmError {
    /// Returns `true` for errors raised during statement compilation,
    /// before any I/O is attempted.
    pub const fn is_compile_error(&self) -> bool {
        matches!(self, Self::MissingTable | Self::MissingSelectOrDelete)
    }
}

/// A convenience alias for `Result<T, OrmError>`.
pub type OrmResult<T> = Result<T, OrmError>;
