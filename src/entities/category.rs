// Category - root of the food hierarchy ("grains", "fruits", ...)

use super::CATEGORIES;
use crate::cascade::{self, NewRow};
use crate::error::Result;
use crate::filter::Filter;
use crate::hierarchy::{self, Identified, Scoped, Table};
use crate::scope::{OrderColumns, RequestScope};
use crate::store::{Executor, FromRow};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// Unique across categories
    pub name: String,
    pub description: String,
}

impl FromRow for Category {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    }
}

impl Identified for Category {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

impl NewCategory {
    pub fn as_row(&self) -> NewRow<'_> {
        NewRow {
            name: &self.name,
            description: &self.description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub category: Filter,
}

impl CategoryFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        CategoryFilter {
            category: Filter::by_name(name),
        }
    }
}

impl Scoped for CategoryFilter {
    fn table(&self) -> &'static Table {
        &CATEGORIES
    }

    fn lineage(&self) -> Vec<&Filter> {
        vec![&self.category]
    }
}

impl OrderColumns for CategoryFilter {
    fn order_columns(&self) -> &[&'static str] {
        CATEGORIES.order_columns
    }
}

pub fn find_categories<E: Executor>(
    db: &E,
    scope: &RequestScope<CategoryFilter>,
) -> Result<Vec<Category>> {
    hierarchy::find_page(db, scope)
}

pub fn create_category<E: Executor>(db: &E, new: &NewCategory) -> Result<Category> {
    let id = cascade::create_root(db, &CATEGORIES, new.as_row())?;

    Ok(Category {
        id,
        name: new.name.clone(),
        description: new.description.clone(),
    })
}

pub fn delete_categories<E: Executor>(db: &E, filter: &CategoryFilter) -> Result<u64> {
    hierarchy::delete_matching(db, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::order::{Direction, OrderBy};
    use crate::store::Session;

    fn new_category(name: &str, description: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    fn seed(db: &Session<'_>) {
        for (name, description) in [
            ("grains", "a single fruit or seed of a cereal"),
            ("fruits", "sweet and fleshy product of a plant"),
            ("dairy", "milk and everything made from it"),
        ] {
            create_category(db, &new_category(name, description)).unwrap();
        }
    }

    #[test]
    fn test_create_and_find_by_name() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        seed(&db);

        let scope = RequestScope::new(CategoryFilter::by_name("fruits"));
        let found = find_categories(&db, &scope).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "fruits");
    }

    #[test]
    fn test_description_is_substring_match() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        seed(&db);

        let filter = CategoryFilter {
            category: Filter::default().with_description("seed"),
        };
        let found = find_categories(&db, &RequestScope::new(filter)).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "grains");
    }

    #[test]
    fn test_description_match_is_case_sensitive() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        seed(&db);

        let filter = CategoryFilter {
            category: Filter::default().with_description("SEED"),
        };
        let found = find_categories(&db, &RequestScope::new(filter)).unwrap();
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn test_order_and_pagination() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        seed(&db);

        let mut scope = RequestScope::new(CategoryFilter::default());
        scope.order_by = vec![OrderBy::new("name", Direction::Desc)];
        scope.limit = 2;
        scope.skip = 1;

        let names: Vec<String> = find_categories(&db, &scope)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["fruits", "dairy"]);
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        seed(&db);

        let all = find_categories(&db, &RequestScope::new(CategoryFilter::default())).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_delete_by_name() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        seed(&db);

        assert_eq!(delete_categories(&db, &CategoryFilter::by_name("dairy")).unwrap(), 1);
        assert_eq!(delete_categories(&db, &CategoryFilter::by_name("dairy")).unwrap(), 0);

        let rest = find_categories(&db, &RequestScope::new(CategoryFilter::default())).unwrap();
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn test_duplicate_name_is_store_error() {
        let conn = open_in_memory().unwrap();
        let db = Session::unbounded(&conn);
        seed(&db);

        let err = create_category(&db, &new_category("grains", "again")).unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
