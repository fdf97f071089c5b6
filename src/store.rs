// Store - the Executor capability and its rusqlite session
//
// Filters, scopes and the cascade writer compose sea-query statements and
// hand them to an `Executor`. `Session` runs them against a borrowed
// `Connection` under a `Deadline`.

use crate::error::{Error, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, Row};
use sea_query::{
    DeleteStatement, InsertStatement, SelectStatement, SqliteQueryBuilder, Value, Values,
};
use std::time::{Duration, Instant};

/// SQLite VM instructions between two deadline checks.
const PROGRESS_STEPS: i32 = 1_000;

/// Savepoint name for nested transactions; SQLite resolves repeats innermost first.
const SAVEPOINT: &str = "nested";

/// Decode one result row. Column order follows the statement's select list.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl FromRow for i64 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

pub trait Executor {
    fn find<T: FromRow>(&self, query: &SelectStatement) -> Result<Vec<T>>;

    /// Insert one row and return its id.
    fn insert(&self, query: &InsertStatement) -> Result<i64>;

    /// Returns the number of rows removed.
    fn delete(&self, query: &DeleteStatement) -> Result<u64>;

    /// Run `f` in a transaction: commit on `Ok`, roll back on `Err`.
    /// Inside another transaction this only scopes `f`'s own writes.
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>;
}

// ============================================================================
// DEADLINE
// ============================================================================

/// Point in time after which store calls give up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn none() -> Self {
        Deadline(None)
    }

    pub fn after(timeout: Duration) -> Self {
        Deadline(Instant::now().checked_add(timeout))
    }

    pub fn at(instant: Instant) -> Self {
        Deadline(Some(instant))
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    pub fn expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

// ============================================================================
// SQLITE SESSION
// ============================================================================

/// A connection borrowed for one operation, bounded by a deadline.
pub struct Session<'c> {
    conn: &'c Connection,
    deadline: Deadline,
}

impl<'c> Session<'c> {
    pub fn new(conn: &'c Connection, deadline: Deadline) -> Self {
        Session { conn, deadline }
    }

    pub fn unbounded(conn: &'c Connection) -> Self {
        Session::new(conn, Deadline::none())
    }

    /// Run `f` with the progress handler armed for the deadline.
    fn run<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        if self.deadline.expired() {
            return Err(Error::DeadlineExceeded);
        }

        let armed = match self.deadline.instant() {
            Some(at) => {
                self.conn
                    .progress_handler(PROGRESS_STEPS, Some(move || Instant::now() >= at));
                true
            }
            None => false,
        };

        let result = f(self.conn);

        if armed {
            self.conn.progress_handler(0, None::<fn() -> bool>);
        }

        result.map_err(|err| {
            if is_interrupt(&err) && self.deadline.expired() {
                Error::DeadlineExceeded
            } else {
                Error::Store(err)
            }
        })
    }

    /// Nested transaction: a savepoint inside the one already open.
    fn savepoint<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.conn.execute_batch(&format!("SAVEPOINT {SAVEPOINT}"))?;

        match f(self) {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE {SAVEPOINT}"))?;
                Ok(value)
            }
            Err(err) => {
                let undo = format!("ROLLBACK TO {SAVEPOINT}; RELEASE {SAVEPOINT}");
                if let Err(rollback) = self.conn.execute_batch(&undo) {
                    tracing::error!(error = %rollback, "savepoint rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl Executor for Session<'_> {
    fn find<T: FromRow>(&self, query: &SelectStatement) -> Result<Vec<T>> {
        let (sql, values) = query.build(SqliteQueryBuilder);
        let params = bind(values)?;
        tracing::debug!(%sql, params = params.len(), "find");

        self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| T::from_row(row))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn insert(&self, query: &InsertStatement) -> Result<i64> {
        let (sql, values) = query.build(SqliteQueryBuilder);
        let params = bind(values)?;
        tracing::debug!(%sql, params = params.len(), "insert");

        self.run(|conn| {
            conn.execute(&sql, params_from_iter(params.iter()))?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn delete(&self, query: &DeleteStatement) -> Result<u64> {
        let (sql, values) = query.build(SqliteQueryBuilder);
        let params = bind(values)?;
        tracing::debug!(%sql, params = params.len(), "delete");

        self.run(|conn| {
            let rows = conn.execute(&sql, params_from_iter(params.iter()))?;
            Ok(rows as u64)
        })
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        if self.deadline.expired() {
            return Err(Error::DeadlineExceeded);
        }
        if !self.conn.is_autocommit() {
            return self.savepoint(f);
        }
        let tx = self.conn.unchecked_transaction()?;

        match f(self) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    tracing::error!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

fn is_interrupt(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::OperationInterrupted
    )
}

/// Convert sea-query parameters into rusqlite values.
fn bind(values: Values) -> Result<Vec<SqlValue>> {
    values.0.into_iter().map(to_sql_value).collect()
}

fn to_sql_value(value: Value) -> Result<SqlValue> {
    let converted = match value {
        Value::Bool(v) => v.map(|b| SqlValue::Integer(b.into())),
        Value::TinyInt(v) => v.map(|n| SqlValue::Integer(n.into())),
        Value::SmallInt(v) => v.map(|n| SqlValue::Integer(n.into())),
        Value::Int(v) => v.map(|n| SqlValue::Integer(n.into())),
        Value::BigInt(v) => v.map(SqlValue::Integer),
        Value::TinyUnsigned(v) => v.map(|n| SqlValue::Integer(n.into())),
        Value::SmallUnsigned(v) => v.map(|n| SqlValue::Integer(n.into())),
        Value::Unsigned(v) => v.map(|n| SqlValue::Integer(n.into())),
        Value::BigUnsigned(v) => match v {
            Some(n) => Some(SqlValue::Integer(
                i64::try_from(n).map_err(|_| Error::Query(format!("{n} does not fit in i64")))?,
            )),
            None => None,
        },
        Value::Float(v) => v.map(|n| SqlValue::Real(n.into())),
        Value::Double(v) => v.map(SqlValue::Real),
        Value::String(v) => v.map(|s| SqlValue::Text(s.to_string())),
        Value::Char(v) => v.map(|c| SqlValue::Text(c.to_string())),
        Value::Bytes(v) => v.map(|b| SqlValue::Blob(b.to_vec())),
        #[allow(unreachable_patterns)]
        other => return Err(Error::Query(format!("unsupported parameter {other:?}"))),
    };

    Ok(converted.unwrap_or(SqlValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use sea_query::{Alias, Expr, Query};

    fn table() -> Alias {
        Alias::new("food_categories")
    }

    fn insert_category(name: &str) -> InsertStatement {
        Query::insert()
            .into_table(table())
            .columns([Alias::new("name"), Alias::new("description")])
            .values_panic([name.into(), "description".into()])
            .to_owned()
    }

    fn count(session: &Session<'_>) -> i64 {
        let query = Query::select()
            .expr(Expr::col(Alias::new("id")).count())
            .from(table())
            .to_owned();
        session.find::<i64>(&query).unwrap()[0]
    }

    #[test]
    fn test_insert_find_delete() {
        let conn = open_in_memory().unwrap();
        let session = Session::unbounded(&conn);

        let id = session.insert(&insert_category("grains")).unwrap();
        assert!(id > 0);

        let ids: Vec<i64> = session
            .find(
                &Query::select()
                    .column(Alias::new("id"))
                    .from(table())
                    .and_where(Expr::col(Alias::new("name")).eq("grains"))
                    .to_owned(),
            )
            .unwrap();
        assert_eq!(ids, vec![id]);

        let deleted = session
            .delete(
                &Query::delete()
                    .from_table(table())
                    .and_where(Expr::col(Alias::new("id")).eq(id))
                    .to_owned(),
            )
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(count(&session), 0);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let conn = open_in_memory().unwrap();
        let session = Session::unbounded(&conn);

        let result: Result<()> = session.transaction(|tx| {
            tx.insert(&insert_category("fruits"))?;
            Err(Error::ParentNotFound { parent: "test" })
        });
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(count(&session), 0);

        session
            .transaction(|tx| tx.insert(&insert_category("fruits")))
            .unwrap();
        assert_eq!(count(&session), 1);
    }

    #[test]
    fn test_store_errors_pass_through() {
        let conn = open_in_memory().unwrap();
        let session = Session::unbounded(&conn);

        session.insert(&insert_category("dairy")).unwrap();
        let err = session.insert(&insert_category("dairy")).unwrap_err();
        assert!(err.is_constraint_violation(), "{err}");
    }

    #[test]
    fn test_expired_deadline_fails_before_store() {
        let conn = open_in_memory().unwrap();
        let past = Instant::now() - Duration::from_millis(1);
        let session = Session::new(&conn, Deadline::at(past));

        let err = session.insert(&insert_category("late")).unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded));
        assert_eq!(count(&Session::unbounded(&conn)), 0);
    }

    #[test]
    fn test_deadline_interrupts_running_statement() {
        let conn = open_in_memory().unwrap();
        let slow = Query::select()
            .expr(Expr::cust(
                "(WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 100000000) SELECT COUNT(*) FROM c)",
            ))
            .to_owned();

        let started = Instant::now();
        let session = Session::new(&conn, Deadline::after(Duration::from_millis(50)));
        let err = session.find::<i64>(&slow).unwrap_err();

        assert!(matches!(err, Error::DeadlineExceeded), "{err}");
        assert!(started.elapsed() < Duration::from_secs(5));

        // handler is disarmed: longer statements run to completion again
        let bounded = Query::select()
            .expr(Expr::cust(
                "(WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 100000) SELECT COUNT(*) FROM c)",
            ))
            .to_owned();
        assert_eq!(Session::unbounded(&conn).find::<i64>(&bounded).unwrap(), vec![100_000]);
        assert_eq!(count(&Session::unbounded(&conn)), 0);
    }

    #[test]
    fn test_nested_transaction_uses_savepoint() {
        let conn = open_in_memory().unwrap();
        let session = Session::unbounded(&conn);

        session
            .transaction(|tx| {
                tx.transaction(|inner| inner.insert(&insert_category("grains")))?;
                let failed: Result<i64> = tx.transaction(|inner| {
                    inner.insert(&insert_category("fruits"))?;
                    Err(Error::ParentNotFound { parent: "test" })
                });
                assert!(failed.is_err());
                Ok(())
            })
            .unwrap();
        assert_eq!(count(&session), 1);

        let outer: Result<()> = session.transaction(|tx| {
            tx.transaction(|inner| inner.insert(&insert_category("dairy")))?;
            Err(Error::ParentNotFound { parent: "test" })
        });
        assert!(outer.is_err());
        assert_eq!(count(&session), 1);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn test_deadline_state() {
        assert!(!Deadline::none().expired());
        assert!(!Deadline::after(Duration::from_secs(60)).expired());
        assert!(Deadline::at(Instant::now() - Duration::from_millis(1)).expired());
    }
}
