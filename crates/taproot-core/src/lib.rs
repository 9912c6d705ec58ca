//! # taproot-core
//!
//! Foundation types shared by every taproot crate: the [`OrmError`](error::OrmError)
//! taxonomy, [`Settings`](settings::Settings) loading, and the
//! [`tracing`]-based logging bootstrap.

pub mod error;
pub mod logging;
pub mod settings;

pub use error::{OrmError, OrmResult};
pub use settings::{CacheSettings, DatabaseSettings, Settings};
