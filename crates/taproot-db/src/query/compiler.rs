//! Statement compilation.
//!
//! [`compile`] turns an accumulated [`ClauseList`] into one SQL string plus
//! an ordered parameter list. The walk order is fixed by the clause sort
//! keys, never by call order, so identical accumulator state always
//! compiles to byte-identical SQL with identically-ordered parameters —
//! the cache key derivation depends on that.
//!
//! Dependency rules are enforced as the walk proceeds: `table` needs a
//! statement head before it (`select`/`delete`), and `where`/`order`/
//! `limit`/`offset` all need `table` already seen. An `update` folds the
//! table reference into its own fragment, so the table entry itself is
//! skipped during emission but still counts as seen.

use taproot_core::{OrmError, OrmResult};

use crate::query::clause::{Clause, ClauseList};
use crate::value::Value;

/// The result of compiling a clause list: SQL plus bound parameters.
///
/// `params` order matches the left-to-right order of `?` placeholders in
/// `sql`: update assignment values first, then where values in the order
/// the where clauses were added.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    /// The complete SQL string.
    pub sql: String,
    /// Bound values, in placeholder order.
    pub params: Vec<Value>,
}

/// Compiles the accumulated clauses into a single statement.
///
/// # Errors
///
/// - [`OrmError::MissingTable`] if `update`, `where`, `order`, `limit` or
///   `offset` is present without a `table` entry.
/// - [`OrmError::MissingSelectOrDelete`] if a `table` entry is compiled
///   without a preceding statement head.
pub fn compile(clauses: &ClauseList) -> OrmResult<CompiledStatement> {
    let mut parts: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    let mut seen_select = false;
    let mut seen_update = false;
    let mut seen_delete = false;
    let mut seen_table = false;
    let mut seen_where = false;

    for clause in clauses.sorted() {
        match clause {
            Clause::Select(fragment) => {
                parts.push(format!("select {fragment}"));
                seen_select = true;
            }
            Clause::Delete => {
                parts.push("delete".to_string());
                seen_delete = true;
            }
            Clause::Update(assignments) => {
                // the table entry is looked up directly; its sort position
                // comes after the update head
                let table = clauses.table_name().ok_or(OrmError::MissingTable)?;
                let set_list = assignments
                    .iter()
                    .map(|(column, _)| format!("{column} = ?"))
                    .collect::<Vec<_>>()
                    .join(", ");
                parts.push(format!("update {table} set {set_list}"));
                params.extend(assignments.iter().map(|(_, value)| value.clone()));
                seen_update = true;
            }
            Clause::Table(fragment) => {
                seen_table = true;
                if seen_update {
                    // already folded into the update fragment
                    continue;
                }
                if !seen_select && !seen_delete {
                    return Err(OrmError::MissingSelectOrDelete);
                }
                parts.push(format!("from {fragment}"));
            }
            Clause::Where { predicate, values } => {
                if !seen_table {
                    return Err(OrmError::MissingTable);
                }
                if seen_where {
                    parts.push(format!("and {predicate}"));
                } else {
                    parts.push(format!("where {predicate}"));
                    seen_where = true;
                }
                params.extend(values.iter().cloned());
            }
            Clause::Order(fragment) => {
                if !seen_table {
                    return Err(OrmError::MissingTable);
                }
                parts.push(format!("order by {fragment}"));
            }
            Clause::Limit(n) => {
                if !seen_table {
                    return Err(OrmError::MissingTable);
                }
                parts.push(format!("limit {n}"));
            }
            Clause::Offset(n) => {
                if !seen_table {
                    return Err(OrmError::MissingTable);
                }
                parts.push(format!("offset {n}"));
            }
        }
    }

    Ok(CompiledStatement {
        sql: parts.join(" "),
        params,
    })
}

/// Builds an `insert` statement for the given columns.
///
/// Insert is not part of the clause language; entity storage compiles it
/// directly from field names.
pub fn compile_insert(table: &str, columns: &[String]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "insert into {table} ({}) values ({placeholders})",
        columns.join(", ")
    )
}
