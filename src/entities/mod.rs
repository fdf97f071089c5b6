// Entity models - category → subcategory → unit
//
// Each level has:
// - a row type decoded from its table
// - a filter type carrying one `Filter` per level of its lineage
// - find / create / delete operations over any `Executor`

pub mod category;
pub mod subcategory;
pub mod unit;

use crate::hierarchy::{ParentLink, Table};

pub use category::{
    create_category, delete_categories, find_categories, Category, CategoryFilter, NewCategory,
};
pub use subcategory::{
    create_subcategory, delete_subcategories, find_subcategories, NewSubcategory, Subcategory,
    SubcategoryFilter,
};
pub use unit::{create_unit, delete_units, find_units, NewUnit, Unit, UnitFilter};

/// Columns callers may sort by, on every level.
const ORDER_COLUMNS: &[&str] = &["id", "name"];

pub static CATEGORIES: Table = Table {
    entity: "category",
    name: "food_categories",
    columns: &["id", "name", "description"],
    order_columns: ORDER_COLUMNS,
    parent: None,
};

pub static SUBCATEGORIES: Table = Table {
    entity: "subcategory",
    name: "food_subcategories",
    columns: &["id", "name", "description", "food_category_id"],
    order_columns: ORDER_COLUMNS,
    parent: Some(ParentLink {
        foreign_key: "food_category_id",
        table: &CATEGORIES,
    }),
};

pub static UNITS: Table = Table {
    entity: "unit",
    name: "food_units",
    columns: &["id", "name", "description", "food_subcategory_id"],
    order_columns: ORDER_COLUMNS,
    parent: Some(ParentLink {
        foreign_key: "food_subcategory_id",
        table: &SUBCATEGORIES,
    }),
};
