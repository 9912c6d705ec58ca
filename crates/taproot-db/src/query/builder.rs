//! The fluent query builder.
//!
//! A [`Query`] accumulates clauses through chained calls and executes on a
//! terminal operation (`find_all`, `find_one`, `count`, `update`,
//! `delete`). Compilation happens on execution; the compiled statement is
//! never cached, only its result is. Mutating terminals invalidate every
//! cached result registered against the target table, after the statement
//! succeeds.

use indexmap::IndexMap;

use taproot_core::{OrmError, OrmResult};

use crate::cache::{CachedResult, QueryCache};
use crate::collection::EntityMeta;
use crate::entity::Entity;
use crate::pagination::Pagination;
use crate::query::clause::{Clause, ClauseKind, ClauseList};
use crate::query::compiler::{compile, CompiledStatement};
use crate::row::Row;
use crate::session::Session;
use crate::value::Value;

/// A composable query against one collection's table.
///
/// Builder methods consume and return `self` for chaining; nothing touches
/// the database until a terminal operation runs.
pub struct Query<'s> {
    session: &'s Session,
    meta: EntityMeta,
    clauses: ClauseList,
    use_cache: bool,
}

impl<'s> Query<'s> {
    /// Creates an empty builder. Obtained through
    /// [`Collection::query`](crate::collection::Collection::query), which
    /// presets the table clause.
    pub(crate) fn new(session: &'s Session, meta: EntityMeta) -> Self {
        Self {
            session,
            meta,
            clauses: ClauseList::new(),
            use_cache: false,
        }
    }

    // ── Clause mutators (lazy) ───────────────────────────────────────

    /// Sets the select list, replacing any previous one.
    #[must_use]
    pub fn select(mut self, fragment: impl Into<String>) -> Self {
        self.clauses.set(Clause::Select(fragment.into()));
        self
    }

    /// Sets the table reference, replacing any previous one. The fragment
    /// may name several comma-separated tables; each becomes an owner
    /// table for cache invalidation.
    #[must_use]
    pub fn table(mut self, fragment: impl Into<String>) -> Self {
        self.clauses.set(Clause::Table(fragment.into()));
        self
    }

    /// Adds a predicate with its bound values. Repeated calls accumulate
    /// and are AND-joined in call order.
    #[must_use]
    pub fn where_(mut self, predicate: impl Into<String>, values: Vec<Value>) -> Self {
        self.clauses.push_where(predicate, values);
        self
    }

    /// Sets the ordering fragment, replacing any previous one.
    #[must_use]
    pub fn order(mut self, fragment: impl Into<String>) -> Self {
        self.clauses.set(Clause::Order(fragment.into()));
        self
    }

    /// Sets the row limit, replacing any previous one.
    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.clauses.set(Clause::Limit(n));
        self
    }

    /// Sets the row offset, replacing any previous one.
    #[must_use]
    pub fn offset(mut self, n: u64) -> Self {
        self.clauses.set(Clause::Offset(n));
        self
    }

    /// Applies a pagination window as limit + offset.
    #[must_use]
    pub fn paginate(self, pager: &Pagination) -> Self {
        self.offset(pager.offset()).limit(pager.per_page())
    }

    /// Opts this query into the external cache tier.
    ///
    /// Without a configured driver the query silently uses the in-memory
    /// tier, like every other query.
    #[must_use]
    pub fn cached(mut self) -> Self {
        self.use_cache = true;
        self
    }

    /// Removes all clauses of the given kind.
    #[must_use]
    pub fn remove(mut self, kind: ClauseKind) -> Self {
        self.clauses.remove(kind);
        self
    }

    /// Empties the accumulated clauses (the target collection is kept).
    #[must_use]
    pub fn reset(mut self) -> Self {
        self.clauses.reset();
        self
    }

    // ── Probes ───────────────────────────────────────────────────────

    /// Returns `true` if a clause of the given kind is present.
    pub fn has_statement(&self, kind: ClauseKind) -> bool {
        self.clauses.has(kind)
    }

    /// Returns the first clause of the given kind, if any.
    pub fn get_statement(&self, kind: ClauseKind) -> Option<&Clause> {
        self.clauses.get(kind)
    }

    /// Compiles the current clause state without executing, for
    /// inspection and debugging.
    pub fn to_sql(&self) -> OrmResult<CompiledStatement> {
        compile(&self.clauses)
    }

    // ── Terminal operations ──────────────────────────────────────────

    /// Runs the query and returns every matching entity, keyed by
    /// primary-key value in result order.
    pub async fn find_all(mut self) -> OrmResult<IndexMap<i64, Entity>> {
        if !self.clauses.has(ClauseKind::Select) {
            self.clauses.set(Clause::Select("*".into()));
        }

        let stmt = compile(&self.clauses)?;
        let key = QueryCache::cache_key(&stmt.sql, &stmt.params);

        if let Some(CachedResult::Rows(rows)) = self.session.cache_lookup(&key, self.use_cache).await
        {
            return self.materialize_all(rows);
        }

        tracing::debug!(sql = %stmt.sql, "executing query");
        let rows = self.session.db().query(&stmt.sql, &stmt.params).await?;
        self.session
            .cache_store(
                &key,
                self.owner_tables(),
                CachedResult::Rows(rows.clone()),
                self.use_cache,
            )
            .await;

        self.materialize_all(rows)
    }

    /// Runs the query with a forced `limit 1` and returns the first
    /// matching entity, if any. Any previously set limit is discarded.
    pub async fn find_one(mut self) -> OrmResult<Option<Entity>> {
        if !self.clauses.has(ClauseKind::Select) {
            self.clauses.set(Clause::Select("*".into()));
        }
        self.clauses.set(Clause::Limit(1));

        let stmt = compile(&self.clauses)?;
        let key = QueryCache::cache_key(&stmt.sql, &stmt.params);

        if let Some(CachedResult::Row(row)) = self.session.cache_lookup(&key, self.use_cache).await
        {
            return Ok(row.map(|r| self.meta.hydrate(r)));
        }

        tracing::debug!(sql = %stmt.sql, "executing query");
        let row = self.session.db().query_row(&stmt.sql, &stmt.params).await?;
        self.session
            .cache_store(
                &key,
                self.owner_tables(),
                CachedResult::Row(row.clone()),
                self.use_cache,
            )
            .await;

        Ok(row.map(|r| self.meta.hydrate(r)))
    }

    /// Runs the query as `select count(*)` and returns the scalar.
    pub async fn count(mut self) -> OrmResult<i64> {
        self.clauses.set(Clause::Select("count(*)".into()));

        let stmt = compile(&self.clauses)?;
        let key = QueryCache::cache_key(&stmt.sql, &stmt.params);

        if let Some(CachedResult::Cell(cell)) = self.session.cache_lookup(&key, self.use_cache).await
        {
            return cell_to_count(&cell);
        }

        tracing::debug!(sql = %stmt.sql, "executing query");
        let cell = self.session.db().query_cell(&stmt.sql, &stmt.params).await?;
        self.session
            .cache_store(
                &key,
                self.owner_tables(),
                CachedResult::Cell(cell.clone()),
                self.use_cache,
            )
            .await;

        cell_to_count(&cell)
    }

    /// Compiles and runs an update with the given assignments, in
    /// assignment order. Returns the affected-row count.
    ///
    /// Cached results for the target table are invalidated only after the
    /// statement succeeds; a compilation error aborts before any I/O.
    pub async fn update(mut self, assignments: Vec<(String, Value)>) -> OrmResult<u64> {
        self.clauses.remove(ClauseKind::Select);
        self.clauses.set(Clause::Update(assignments));

        let stmt = compile(&self.clauses)?;
        tracing::debug!(sql = %stmt.sql, "executing update");
        let affected = self.session.db().execute(&stmt.sql, &stmt.params).await?;

        self.session.invalidate_table(self.owner_tables()).await;
        Ok(affected)
    }

    /// Compiles and runs a delete. Returns the affected-row count.
    ///
    /// Cache invalidation follows the same rules as [`update`](Self::update).
    pub async fn delete(mut self) -> OrmResult<u64> {
        self.clauses.remove(ClauseKind::Select);
        self.clauses.set(Clause::Delete);

        let stmt = compile(&self.clauses)?;
        tracing::debug!(sql = %stmt.sql, "executing delete");
        let affected = self.session.db().execute(&stmt.sql, &stmt.params).await?;

        self.session.invalidate_table(self.owner_tables()).await;
        Ok(affected)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn owner_tables(&self) -> &str {
        self.clauses.table_name().unwrap_or(&self.meta.table)
    }

    fn materialize_all(&self, rows: Vec<Row>) -> OrmResult<IndexMap<i64, Entity>> {
        let mut result = IndexMap::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.get(&self.meta.primary_key).map_err(|_| {
                OrmError::ConversionError(format!(
                    "row in '{}' has no integer primary key '{}'",
                    self.meta.table, self.meta.primary_key
                ))
            })?;
            result.insert(id, self.meta.hydrate(row));
        }
        Ok(result)
    }
}

fn cell_to_count(cell: &Value) -> OrmResult<i64> {
    cell.as_int()
        .ok_or_else(|| OrmError::ConversionError(format!("count() returned {cell:?}")))
}
