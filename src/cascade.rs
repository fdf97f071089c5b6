// Cascade writer - create a child row only under a parent that exists
//
// Parent lookup and child insert share one transaction. No parent means
// ParentNotFound and a rollback; any store error rolls back as well. There
// are no retries.

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::hierarchy::{self, Identified, Table};
use crate::store::{Executor, FromRow};
use sea_query::{Alias, InsertStatement, Order, Query, SimpleExpr};

/// Name and description of a row about to be written.
#[derive(Debug, Clone, Copy)]
pub struct NewRow<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

impl NewRow<'_> {
    /// Both fields are required and may not be blank.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::required("name"));
        }
        if self.description.trim().is_empty() {
            return Err(Error::required("description"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Created<P> {
    pub id: i64,
    pub parent: P,
}

/// `INSERT INTO table (name, description[, fk]) VALUES (...)`.
pub fn insert_row(
    table: &'static Table,
    row: NewRow<'_>,
    parent: Option<(&'static str, i64)>,
) -> Result<InsertStatement> {
    let mut columns = vec![Alias::new("name"), Alias::new("description")];
    let mut values = vec![
        SimpleExpr::Value(row.name.into()),
        SimpleExpr::Value(row.description.into()),
    ];
    if let Some((foreign_key, parent_id)) = parent {
        columns.push(Alias::new(foreign_key));
        values.push(SimpleExpr::Value(parent_id.into()));
    }

    let mut query = Query::insert();
    query
        .into_table(Alias::new(table.name))
        .columns(columns)
        .values(values)
        .map_err(|err| Error::Query(err.to_string()))?;
    Ok(query)
}

/// Create a root row; nothing to resolve.
pub fn create_root<E: Executor>(db: &E, table: &'static Table, row: NewRow<'_>) -> Result<i64> {
    row.validate()?;
    let statement = insert_row(table, row, None)?;

    let id = db.transaction(|tx| tx.insert(&statement))?;
    tracing::info!(table = table.name, id, name = row.name, "row created");
    Ok(id)
}

/// Resolve the parent matched by `parent_lineage` and create `row` under it.
///
/// When the lineage matches several parents the lowest id wins.
pub fn create_child<E, P>(
    db: &E,
    child: &'static Table,
    parent_lineage: &[&Filter],
    row: NewRow<'_>,
) -> Result<Created<P>>
where
    E: Executor,
    P: FromRow + Identified,
{
    row.validate()?;
    let link = child
        .parent
        .as_ref()
        .ok_or_else(|| Error::Query(format!("{} has no parent table", child.name)))?;

    let mut lookup = hierarchy::select(link.table, parent_lineage);
    lookup
        .order_by((Alias::new(link.table.name), Alias::new("id")), Order::Asc)
        .limit(1);

    db.transaction(|tx| {
        let Some(parent) = tx.find::<P>(&lookup)?.into_iter().next() else {
            tracing::warn!(
                table = child.name,
                parent = link.table.entity,
                name = row.name,
                "parent not found, nothing created"
            );
            return Err(Error::ParentNotFound {
                parent: link.table.entity,
            });
        };

        let id = tx.insert(&insert_row(
            child,
            row,
            Some((link.foreign_key, parent.id())),
        )?)?;
        tracing::info!(
            table = child.name,
            id,
            parent_id = parent.id(),
            name = row.name,
            "row created"
        );
        Ok(Created { id, parent })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{count_rows, open_in_memory};
    use crate::entities::{Category, CATEGORIES, SUBCATEGORIES};
    use crate::store::Session;
    use sea_query::SqliteQueryBuilder;

    fn row<'a>(name: &'a str, description: &'a str) -> NewRow<'a> {
        NewRow { name, description }
    }

    #[test]
    fn test_validate_requires_fields() {
        assert!(row("grains", "seeds of cereals").validate().is_ok());
        assert!(matches!(
            row(" ", "x").validate(),
            Err(Error::Invalid { field: "name", .. })
        ));
        assert!(matches!(
            row("grains", "").validate(),
            Err(Error::Invalid { field: "description", .. })
        ));
    }

    #[test]
    fn test_insert_row_renders_foreign_key() {
        let sql = insert_row(&SUBCATEGORIES, row("berries", "small fruits"), Some(("food_category_id", 4)))
            .unwrap()
            .to_string(SqliteQueryBuilder);
        assert_eq!(
            sql,
            r#"INSERT INTO "food_subcategories" ("name", "description", "food_category_id") VALUES ('berries', 'small fruits', 4)"#
        );
    }

    #[test]
    fn test_child_created_under_resolved_parent() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        let category_id = create_root(&db, &CATEGORIES, row("fruits", "sweet things")).unwrap();

        let parent = Filter::by_name("fruits");
        let created: Created<Category> =
            create_child(&db, &SUBCATEGORIES, &[&parent], row("berries", "small fruits")).unwrap();

        assert_eq!(created.parent.id, category_id);
        assert_eq!(created.parent.name, "fruits");
        assert_eq!(count_rows(&conn, SUBCATEGORIES.name).unwrap(), 1);
    }

    #[test]
    fn test_missing_parent_aborts_without_writing() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        create_root(&db, &CATEGORIES, row("fruits", "sweet things")).unwrap();

        let parent = Filter::by_name("vegetables");
        let err = create_child::<_, Category>(&db, &SUBCATEGORIES, &[&parent], row("kale", "leafy"))
            .unwrap_err();

        assert!(matches!(err, Error::ParentNotFound { parent: "category" }));
        assert_eq!(count_rows(&conn, SUBCATEGORIES.name).unwrap(), 0);
    }

    #[test]
    fn test_store_error_in_child_insert_rolls_back() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        create_root(&db, &CATEGORIES, row("fruits", "sweet things")).unwrap();

        let parent = Filter::by_name("fruits");
        create_child::<_, Category>(&db, &SUBCATEGORIES, &[&parent], row("berries", "small")).unwrap();
        let err = create_child::<_, Category>(&db, &SUBCATEGORIES, &[&parent], row("berries", "again"))
            .unwrap_err();

        assert!(err.is_constraint_violation(), "{err}");
        assert_eq!(count_rows(&conn, SUBCATEGORIES.name).unwrap(), 1);
    }

    #[test]
    fn test_root_table_cannot_be_a_child() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        let err = create_child::<_, Category>(&db, &CATEGORIES, &[], row("a", "b")).unwrap_err();
        assert!(matches!(err, Error::Query(_)));
    }
}
