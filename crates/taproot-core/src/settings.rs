//! Application settings.
//!
//! Settings are plain data deserialized from TOML. Nothing here is global:
//! the loaded [`Settings`] value is handed to whatever needs it (logging
//! setup, session construction) explicitly.

use serde::Deserialize;

use crate::error::{OrmError, OrmResult};

/// Top-level settings for an application using taproot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enables pretty log output and verbose diagnostics.
    pub debug: bool,
    /// Log filter directive, e.g. `"info"` or `"taproot_db=debug"`.
    pub log_level: String,
    /// Database connection settings.
    pub database: DatabaseSettings,
    /// Query-cache settings.
    pub cache: CacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            database: DatabaseSettings::default(),
            cache: CacheSettings::default(),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the database file, or `":memory:"`.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
        }
    }
}

/// Query-cache settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Whether an external cache driver should be attached to new sessions.
    pub enabled: bool,
}

impl Settings {
    /// Parses settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ConfigurationError`] if the TOML is malformed.
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        toml::from_str(raw).map_err(|e| OrmError::ConfigurationError(e.to_string()))
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ConfigurationError`] if the file cannot be read
    /// or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> OrmResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| OrmError::ConfigurationError(e.to_string()))?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.database.path, ":memory:");
        assert!(!settings.cache.enabled);
    }

    #[test]
    fn test_from_toml_str() {
        let settings = Settings::from_toml_str(
            r#"
            debug = true
            log_level = "debug"

            [database]
            path = "app.db"

            [cache]
            enabled = true
            "#,
        )
        .unwrap();
        assert!(settings.debug);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.database.path, "app.db");
        assert!(settings.cache.enabled);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let settings = Settings::from_toml_str("debug = true").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.database.path, ":memory:");
    }

    #[test]
    fn test_malformed_toml_is_a_configuration_error() {
        let err = Settings::from_toml_str("debug = [").unwrap_err();
        assert!(matches!(err, OrmError::ConfigurationError(_)));
    }
}
