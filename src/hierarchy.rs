// Hierarchy joiner - one builder for category, subcategory and unit
//
// Driven by `Table` metadata. A lineage is the list of filters for a table
// and its ancestors, nearest first: `[unit, subcategory, category]`.
//
// Reads join ancestors directly so their predicates apply to the joined
// tables. Deletes constrain the foreign key with `IN (SELECT id ...)`
// subqueries and never join. Either way the chain only goes as far up as
// the farthest ancestor that actually carries a filter; reads always join
// at least the immediate parent.

use crate::error::Result;
use crate::filter::{column, Filter};
use crate::scope::{OrderColumns, RequestScope};
use crate::store::{Executor, FromRow};
use sea_query::{Alias, DeleteStatement, Order, Query, SelectStatement, SimpleExpr};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug)]
pub struct Table {
    /// Entity name used in messages ("category").
    pub entity: &'static str,
    pub name: &'static str,
    /// Select list, in the order `FromRow` implementations read it.
    pub columns: &'static [&'static str],
    pub order_columns: &'static [&'static str],
    pub parent: Option<ParentLink>,
}

#[derive(Debug)]
pub struct ParentLink {
    /// Foreign key column on the child table.
    pub foreign_key: &'static str,
    pub table: &'static Table,
}

/// Types that carry one filter per level of their table's lineage.
pub trait Scoped {
    fn table(&self) -> &'static Table;
    fn lineage(&self) -> Vec<&Filter>;
}

/// Rows with an integer primary key.
pub trait Identified {
    fn id(&self) -> i64;
}

impl Table {
    /// Number of ancestors above this table.
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    pub fn ancestors(&self) -> impl Iterator<Item = (&'static str, &'static Table)> + '_ {
        std::iter::successors(self.parent.as_ref(), |link| link.table.parent.as_ref())
            .map(|link| (link.foreign_key, link.table))
    }

    fn select_columns(&self, query: &mut SelectStatement) {
        for name in self.columns {
            query.column((Alias::new(self.name), Alias::new(*name)));
        }
    }
}

/// How many ancestor levels the lineage constrains.
fn filtered_depth(lineage: &[&Filter]) -> usize {
    lineage
        .iter()
        .rposition(|filter| !filter.is_empty())
        .unwrap_or(0)
}

// ============================================================================
// READS: direct join
// ============================================================================

/// `SELECT <table columns> FROM table JOIN ancestors ... WHERE ...`.
pub fn select(table: &'static Table, lineage: &[&Filter]) -> SelectStatement {
    let mut query = Query::select();
    table.select_columns(&mut query);
    query.from(Alias::new(table.name));

    let depth = filtered_depth(lineage).max(1).min(table.depth());
    let mut child = table;
    for (level, (foreign_key, parent)) in table.ancestors().take(depth).enumerate() {
        query.inner_join(
            Alias::new(parent.name),
            column(child.name, foreign_key).equals((Alias::new(parent.name), Alias::new("id"))),
        );
        if let Some(filter) = lineage.get(level + 1) {
            for predicate in filter.predicates(parent.name) {
                query.and_where(predicate);
            }
        }
        child = parent;
    }

    if let Some(own) = lineage.first() {
        for predicate in own.predicates(table.name) {
            query.and_where(predicate);
        }
    }

    query
}

/// One page of rows matching the scope's filter, ordered and paginated.
pub fn find_page<E, S, T>(db: &E, scope: &RequestScope<S>) -> Result<Vec<T>>
where
    E: Executor,
    S: Scoped + OrderColumns,
    T: FromRow,
{
    let table = scope.filter.table();
    let mut query = select(table, &scope.filter.lineage());
    scope.apply(&mut query, table.name);
    db.find(&query)
}

/// Rows of `table` whose id is in `ids`, ordered by id.
pub fn select_by_ids(table: &'static Table, ids: &BTreeSet<i64>) -> SelectStatement {
    let mut query = Query::select();
    table.select_columns(&mut query);
    query
        .from(Alias::new(table.name))
        .and_where(column(table.name, "id").is_in(ids.iter().copied()))
        .order_by((Alias::new(table.name), Alias::new("id")), Order::Asc);
    query
}

/// Load the rows of `table` referenced by `ids`, keyed by id.
pub fn load_by_ids<E, T>(db: &E, table: &'static Table, ids: BTreeSet<i64>) -> Result<HashMap<i64, T>>
where
    E: Executor,
    T: FromRow + Identified,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<T> = db.find(&select_by_ids(table, &ids))?;
    Ok(rows.into_iter().map(|row| (row.id(), row)).collect())
}

// ============================================================================
// DELETES: membership subquery
// ============================================================================

/// Predicates restricting `table` to the lineage, ancestors expressed as
/// nested `IN (SELECT id ...)` subqueries.
fn membership(table: &'static Table, lineage: &[&Filter]) -> Vec<SimpleExpr> {
    let mut predicates = lineage
        .first()
        .map(|own| own.predicates(table.name))
        .unwrap_or_default();

    if filtered_depth(lineage) == 0 {
        return predicates;
    }

    if let Some(link) = &table.parent {
        let ancestors = lineage.get(1..).unwrap_or_default();
        predicates.push(
            column(table.name, link.foreign_key).in_subquery(select_ids(link.table, ancestors)),
        );
    }

    predicates
}

/// `SELECT id FROM table WHERE <membership>`; a decoupled sub-select.
pub fn select_ids(table: &'static Table, lineage: &[&Filter]) -> SelectStatement {
    let mut query = Query::select();
    query
        .column((Alias::new(table.name), Alias::new("id")))
        .from(Alias::new(table.name));
    for predicate in membership(table, lineage) {
        query.and_where(predicate);
    }
    query
}

/// `DELETE FROM table WHERE <membership>`.
pub fn delete(table: &'static Table, lineage: &[&Filter]) -> DeleteStatement {
    let mut query = Query::delete();
    query.from_table(Alias::new(table.name));
    for predicate in membership(table, lineage) {
        query.and_where(predicate);
    }
    query
}

/// Delete everything the scoped filter matches, in its own transaction.
pub fn delete_matching<E: Executor, S: Scoped>(db: &E, scoped: &S) -> Result<u64> {
    let table = scoped.table();
    let statement = delete(table, &scoped.lineage());

    let rows = db.transaction(|tx| tx.delete(&statement))?;
    tracing::info!(table = table.name, rows, "rows deleted");
    Ok(rows)
}
