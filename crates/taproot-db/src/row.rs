//! Generic database rows.
//!
//! A [`Row`] pairs column names with [`Value`]s and offers typed access via
//! [`FromValue`]. Rows are what backends return and what the query cache
//! stores; entity hydration happens on top of them.

use serde::{Deserialize, Serialize};

use taproot_core::{OrmError, OrmResult};

use crate::value::Value;

/// A single result row: column names plus their values, in select order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "row column count must match value count"
        );
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the raw value stored under `column`, if present.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ConversionError`] if the column does not exist or
    /// the value cannot be converted to the requested type.
    pub fn get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self.get_value(column).ok_or_else(|| {
            OrmError::ConversionError(format!("column '{column}' not found in row"))
        })?;
        T::from_value(value)
    }

    /// Consumes the row, returning `(columns, values)`.
    pub fn into_parts(self) -> (Vec<String>, Vec<Value>) {
        (self.columns, self.values)
    }
}

/// Conversion from a [`Value`] reference to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> OrmResult<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(OrmError::ConversionError(format!(
                "expected Int, got {value:?}"
            ))),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            _ => Err(OrmError::ConversionError(format!(
                "expected Float, got {value:?}"
            ))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(OrmError::ConversionError(format!(
                "expected Bool, got {value:?}"
            ))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(OrmError::ConversionError(format!(
                "expected String, got {value:?}"
            ))),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Uuid(u) => Ok(*u),
            _ => Err(OrmError::ConversionError(format!(
                "expected Uuid, got {value:?}"
            ))),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> OrmResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::new(
            vec!["id".to_string(), "name".to_string(), "bio".to_string()],
            vec![Value::Int(1), Value::String("Alice".into()), Value::Null],
        )
    }

    #[test]
    fn test_typed_get() {
        let row = sample();
        assert_eq!(row.get::<i64>("id").unwrap(), 1);
        assert_eq!(row.get::<String>("name").unwrap(), "Alice");
    }

    #[test]
    fn test_optional_get() {
        let row = sample();
        assert_eq!(row.get::<Option<String>>("bio").unwrap(), None);
        assert_eq!(
            row.get::<Option<String>>("name").unwrap(),
            Some("Alice".to_string())
        );
    }

    #[test]
    fn test_missing_column() {
        let row = sample();
        assert!(matches!(
            row.get::<i64>("missing"),
            Err(OrmError::ConversionError(_))
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let row = sample();
        assert!(row.get::<bool>("id").is_err());
    }

    #[test]
    fn test_get_value() {
        let row = sample();
        assert_eq!(row.get_value("id"), Some(&Value::Int(1)));
        assert_eq!(row.get_value("missing"), None);
    }

    #[test]
    #[should_panic(expected = "row column count must match value count")]
    fn test_mismatched_lengths_panic() {
        let _ = Row::new(vec!["a".to_string()], vec![]);
    }

    #[test]
    fn test_serde_round_trip() {
        let row = sample();
        let json = serde_json::to_value(&row).unwrap();
        let back: Row = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }
}
