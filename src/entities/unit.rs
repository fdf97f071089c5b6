// Unit - leaf level ("apple", "carrot"), owned by exactly one subcategory

use super::subcategory::attach_categories;
use super::{Subcategory, SubcategoryFilter, SUBCATEGORIES, UNITS};
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
pub struct Unit {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub subcategory_id: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subcategory: Option<Subcategory>,
}

impl FromRow for Unit {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Unit {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            subcategory_id: row.get(3)?,
            subcategory: None,
        })
    }
}

impl Identified for Unit {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUnit {
    pub name: String,
    pub description: String,
}

impl NewUnit {
    pub fn as_row(&self) -> NewRow<'_> {
        NewRow {
            name: &self.name,
            description: &self.description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFilter {
    pub unit: Filter,
    pub subcategory: Filter,
    pub category: Filter,
}

impl UnitFilter {
    pub fn by_names(category: Option<&str>, subcategory: Option<&str>, unit: Option<&str>) -> Self {
        UnitFilter {
            unit: Filter::by_optional_name(unit),
            subcategory: Filter::by_optional_name(subcategory),
            category: Filter::by_optional_name(category),
        }
    }
}

impl Scoped for UnitFilter {
    fn table(&self) -> &'static Table {
        &UNITS
    }

    fn lineage(&self) -> Vec<&Filter> {
        vec![&self.unit, &self.subcategory, &self.category]
    }
}

impl OrderColumns for UnitFilter {
    fn order_columns(&self) -> &[&'static str] {
        UNITS.order_columns
    }
}

/// Fill in `subcategory`, and its `category`, on each unit.
fn attach_subcategories<E: Executor>(db: &E, units: &mut [Unit]) -> Result<()> {
    let ids: BTreeSet<i64> = units.iter().map(|u| u.subcategory_id).collect();
    let mut subcategories: Vec<Subcategory> =
        hierarchy::load_by_ids::<_, Subcategory>(db, &SUBCATEGORIES, ids)?
            .into_values()
            .collect();
    attach_categories(db, &mut subcategories)?;

    for unit in units.iter_mut() {
        unit.subcategory = subcategories
            .iter()
            .find(|s| s.id == unit.subcategory_id)
            .cloned();
    }
    Ok(())
}

pub fn find_units<E: Executor>(db: &E, scope: &RequestScope<UnitFilter>) -> Result<Vec<Unit>> {
    let mut page: Vec<Unit> = hierarchy::find_page(db, scope)?;
    attach_subcategories(db, &mut page)?;
    Ok(page)
}

/// Create a unit under the subcategory matched by `subcategory`.
pub fn create_unit<E: Executor>(
    db: &E,
    new: &NewUnit,
    subcategory: &SubcategoryFilter,
) -> Result<Unit> {
    let Created { id, mut parent } = cascade::create_child::<_, Subcategory>(
        db,
        &UNITS,
        &subcategory.lineage(),
        new.as_row(),
    )?;
    attach_categories(db, std::slice::from_mut(&mut parent))?;

    Ok(Unit {
        id,
        name: new.name.clone(),
        description: new.description.clone(),
        subcategory_id: parent.id,
        subcategory: Some(parent),
    })
}

pub fn delete_units<E: Executor>(db: &E, filter: &UnitFilter) -> Result<u64> {
    hierarchy::delete_matching(db, filter)
}
