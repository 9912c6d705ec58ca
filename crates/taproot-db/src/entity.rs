//! Dynamic entity records.
//!
//! An [`Entity`] is a keyed bag of [`Value`]s with a distinguished
//! primary-key field, per-field modified tracking and a loaded flag that
//! decides whether [`store`](Entity::store) inserts or updates. Field order
//! is preserved so that the SQL compiled from an entity is deterministic.

use indexmap::IndexMap;

use taproot_core::{OrmError, OrmResult};

use crate::collection::EntityMeta;
use crate::query::builder::Query;
use crate::query::compiler::compile_insert;
use crate::row::Row;
use crate::session::Session;
use crate::value::Value;

/// A single database record materialized as a property bag.
#[derive(Debug, Clone)]
pub struct Entity {
    meta: EntityMeta,
    storage: IndexMap<String, Value>,
    modified_fields: IndexMap<String, bool>,
    modified: bool,
    loaded: bool,
}

impl Entity {
    /// Creates a blank, unsaved entity.
    pub(crate) fn blank(meta: EntityMeta) -> Self {
        Self {
            meta,
            storage: IndexMap::new(),
            modified_fields: IndexMap::new(),
            modified: false,
            loaded: false,
        }
    }

    /// Builds an entity from a database row.
    pub(crate) fn hydrated(meta: EntityMeta, row: Row) -> Self {
        let (columns, values) = row.into_parts();
        let storage: IndexMap<String, Value> = columns.into_iter().zip(values).collect();
        let modified_fields = storage.keys().map(|k| (k.clone(), false)).collect();
        Self {
            meta,
            storage,
            modified_fields,
            modified: false,
            loaded: true,
        }
    }

    /// Returns the table this entity belongs to.
    pub fn table(&self) -> &str {
        &self.meta.table
    }

    /// Returns the primary-key value, if it is set and an integer.
    pub fn id(&self) -> Option<i64> {
        self.storage
            .get(&self.meta.primary_key)
            .and_then(Value::as_int)
    }

    /// Returns `true` if this entity was loaded from (or stored to) the
    /// database.
    pub const fn loaded(&self) -> bool {
        self.loaded
    }

    /// Returns `true` if any field changed since the last load/store.
    pub const fn modified(&self) -> bool {
        self.modified
    }

    /// Returns whether the given field changed, or `None` if it is absent.
    pub fn field_modified(&self, field: &str) -> Option<bool> {
        self.modified_fields.get(field).copied()
    }

    /// Returns the value of a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.storage.get(field)
    }

    /// Returns `true` if the field exists, even when set to `Null`.
    pub fn field_exists(&self, field: &str) -> bool {
        self.storage.contains_key(field)
    }

    /// Returns the field names, in insertion order.
    pub fn fields(&self) -> Vec<&str> {
        self.storage.keys().map(String::as_str).collect()
    }

    /// Sets a field value, tracking whether it actually changed.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        let changed = self.storage.get(&field) != Some(&value);
        self.modified_fields.insert(field.clone(), changed);
        self.storage.insert(field, value);
        if changed {
            self.modified = true;
        }
    }

    /// Exports the fields as an ordered map.
    pub fn export(&self) -> IndexMap<String, Value> {
        self.storage.clone()
    }

    /// Persists the entity: an update when it was loaded, an insert
    /// otherwise. On insert the generated primary key is adopted.
    ///
    /// Cached queries against this entity's table are invalidated after
    /// the statement succeeds. Returns the primary-key value.
    pub async fn store(&mut self, session: &Session) -> OrmResult<i64> {
        if self.loaded {
            self.store_update(session).await?;
        } else {
            self.store_insert(session).await?;
        }

        self.modified = false;
        for flag in self.modified_fields.values_mut() {
            *flag = false;
        }
        self.loaded = true;

        self.id().ok_or_else(|| {
            OrmError::ConversionError(format!(
                "entity in '{}' has no integer primary key after store",
                self.meta.table
            ))
        })
    }

    async fn store_update(&self, session: &Session) -> OrmResult<()> {
        let id = self.id().ok_or_else(|| {
            OrmError::ConversionError(format!(
                "cannot update entity in '{}' without a primary key",
                self.meta.table
            ))
        })?;

        let assignments: Vec<(String, Value)> = self
            .storage
            .iter()
            .filter(|(field, _)| *field != &self.meta.primary_key)
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();

        if assignments.is_empty() {
            return Ok(());
        }

        Query::new(session, self.meta.clone())
            .table(self.meta.table.clone())
            .where_(
                format!("{} = ?", self.meta.primary_key),
                vec![Value::Int(id)],
            )
            .update(assignments)
            .await?;

        Ok(())
    }

    async fn store_insert(&mut self, session: &Session) -> OrmResult<()> {
        // the primary key is left to the database unless explicitly set
        let mut columns: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        for (field, value) in &self.storage {
            if field == &self.meta.primary_key && value.is_null() {
                continue;
            }
            columns.push(field.clone());
            params.push(value.clone());
        }

        let sql = compile_insert(&self.meta.table, &columns);
        tracing::debug!(sql = %sql, "executing insert");
        session.db().execute(&sql, &params).await?;

        let id = session.db().last_insert_id().await?;
        session.invalidate_table(&self.meta.table).await;
        self.storage.insert(self.meta.primary_key.clone(), id);
        Ok(())
    }

    /// Deletes the underlying record and clears the entity's state.
    ///
    /// Returns the affected-row count.
    pub async fn delete(&mut self, session: &Session) -> OrmResult<u64> {
        let id = self.id().ok_or_else(|| {
            OrmError::ConversionError(format!(
                "cannot delete entity in '{}' without a primary key",
                self.meta.table
            ))
        })?;

        let affected = Query::new(session, self.meta.clone())
            .table(self.meta.table.clone())
            .where_(
                format!("{} = ?", self.meta.primary_key),
                vec![Value::Int(id)],
            )
            .delete()
            .await?;

        self.storage.clear();
        self.modified_fields.clear();
        self.modified = false;
        self.loaded = false;
        Ok(affected)
    }

    /// Re-reads the record from the database.
    ///
    /// Returns `true` if the record was found and the entity rehydrated,
    /// `false` if the entity was never loaded or the row is gone.
    pub async fn reload(&mut self, session: &Session) -> OrmResult<bool> {
        if !self.loaded {
            return Ok(false);
        }
        let Some(id) = self.id() else {
            return Ok(false);
        };

        let sql = format!(
            "select * from {} where {} = ?",
            self.meta.table, self.meta.primary_key
        );
        let Some(row) = session.db().query_row(&sql, &[Value::Int(id)]).await? else {
            return Ok(false);
        };

        *self = Self::hydrated(self.meta.clone(), row);
        Ok(true)
    }
}
