// Subcategory - middle level, owned by exactly one category

use super::{Category, SUBCATEGORIES};
use crate::cascade::{self, Created, NewRow};
use crate::error::Result;
use crate::filter::Filter;
use crate::hierarchy::{self, Identified, Scoped, Table};
use crate::scope::{OrderColumns, RequestScope};
use crate::store::{Executor, FromRow};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category_id: i64,
    /// Owning category; loaded after every read.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category: Option<Category>,
}

impl FromRow for Subcategory {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Subcategory {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category_id: row.get(3)?,
            category: None,
        })
    }
}

impl Identified for Subcategory {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSubcategory {
    pub name: String,
    pub description: String,
}

impl NewSubcategory {
    pub fn as_row(&self) -> NewRow<'_> {
        NewRow {
            name: &self.name,
            description: &self.description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubcategoryFilter {
    pub subcategory: Filter,
    pub category: Filter,
}

impl SubcategoryFilter {
    /// Filter from optional path segments; empty segments add no constraint.
    pub fn by_names(category: Option<&str>, subcategory: Option<&str>) -> Self {
        SubcategoryFilter {
            subcategory: Filter::by_optional_name(subcategory),
            category: Filter::by_optional_name(category),
        }
    }
}

impl Scoped for SubcategoryFilter {
    fn table(&self) -> &'static Table {
        &SUBCATEGORIES
    }

    fn lineage(&self) -> Vec<&Filter> {
        vec![&self.subcategory, &self.category]
    }
}

impl OrderColumns for SubcategoryFilter {
    fn order_columns(&self) -> &[&'static str] {
        SUBCATEGORIES.order_columns
    }
}

/// Fill in `category` on each subcategory.
pub(crate) fn attach_categories<E: Executor>(db: &E, subcategories: &mut [Subcategory]) -> Result<()> {
    let ids: BTreeSet<i64> = subcategories.iter().map(|s| s.category_id).collect();
    let categories = hierarchy::load_by_ids::<_, Category>(db, &super::CATEGORIES, ids)?;

    for subcategory in subcategories.iter_mut() {
        subcategory.category = categories.get(&subcategory.category_id).cloned();
    }
    Ok(())
}

pub fn find_subcategories<E: Executor>(
    db: &E,
    scope: &RequestScope<SubcategoryFilter>,
) -> Result<Vec<Subcategory>> {
    let mut page: Vec<Subcategory> = hierarchy::find_page(db, scope)?;
    attach_categories(db, &mut page)?;
    Ok(page)
}

/// Create a subcategory under the category matched by `category`.
pub fn create_subcategory<E: Executor>(
    db: &E,
    new: &NewSubcategory,
    category: &Filter,
) -> Result<Subcategory> {
    let Created { id, parent } =
        cascade::create_child::<_, Category>(db, &SUBCATEGORIES, &[category], new.as_row())?;

    Ok(Subcategory {
        id,
        name: new.name.clone(),
        description: new.description.clone(),
        category_id: parent.id,
        category: Some(parent),
    })
}

pub fn delete_subcategories<E: Executor>(db: &E, filter: &SubcategoryFilter) -> Result<u64> {
    hierarchy::delete_matching(db, filter)
}
