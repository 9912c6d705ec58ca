//! Collections: per-table entry points for queries and entities.
//!
//! A [`Collection`] is obtained from a [`Session`](crate::session::Session)
//! and owns the [`EntityMeta`] describing its table. The meta doubles as
//! the hydration hook: the query layer hands it raw rows and gets
//! [`Entity`] values back, without knowing anything about how entities are
//! put together.

use taproot_core::OrmResult;

use crate::entity::Entity;
use crate::query::builder::Query;
use crate::row::Row;
use crate::session::Session;
use crate::value::Value;

/// The primary-key column used unless a collection overrides it.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Table metadata plus the row-to-entity hydration hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMeta {
    /// The table name.
    pub table: String,
    /// The primary-key column name.
    pub primary_key: String,
}

impl EntityMeta {
    /// Creates metadata for a table with the default primary key.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
        }
    }

    /// Materializes a database row into an entity.
    pub fn hydrate(&self, row: Row) -> Entity {
        Entity::hydrated(self.clone(), row)
    }

    /// Creates a blank, unsaved entity.
    pub fn blank(&self) -> Entity {
        Entity::blank(self.clone())
    }
}

/// A per-table handle for building queries and creating entities.
pub struct Collection<'s> {
    session: &'s Session,
    meta: EntityMeta,
}

impl<'s> Collection<'s> {
    /// Creates a collection for the given table name.
    ///
    /// The name is sanitized to identifier characters before it is ever
    /// interpolated into SQL.
    pub fn new(session: &'s Session, name: &str) -> Self {
        Self {
            session,
            meta: EntityMeta::new(clean_identifier(name)),
        }
    }

    /// Overrides the primary-key column.
    #[must_use]
    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.meta.primary_key = clean_identifier(&primary_key.into());
        self
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.meta.table
    }

    /// Returns the entity metadata.
    pub const fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    /// Returns a query builder rooted at this collection's table.
    pub fn query(&self) -> Query<'s> {
        Query::new(self.session, self.meta.clone()).table(self.meta.table.clone())
    }

    /// Loads the entity with the given primary-key value, if it exists.
    pub async fn load(&self, id: i64) -> OrmResult<Option<Entity>> {
        self.query()
            .where_(format!("{} = ?", self.meta.primary_key), vec![Value::Int(id)])
            .find_one()
            .await
    }

    /// Creates a blank entity bound to this collection's table.
    ///
    /// The entity is not persisted until [`Entity::store`] is called.
    pub fn create(&self) -> Entity {
        self.meta.blank()
    }

    /// Counts all rows in the table.
    pub async fn count(&self) -> OrmResult<i64> {
        self.query().count().await
    }
}

/// Strips everything but identifier characters from a name.
fn clean_identifier(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_identifier() {
        assert_eq!(clean_identifier("users"), "users");
        assert_eq!(clean_identifier("user_role"), "user_role");
        assert_eq!(clean_identifier("users; drop table x"), "usersdroptablex");
    }

    #[test]
    fn test_meta_defaults() {
        let meta = EntityMeta::new("session");
        assert_eq!(meta.table, "session");
        assert_eq!(meta.primary_key, "id");
    }
}
