// Food Catalog - Core Library
// Query layer over the category → subcategory → unit hierarchy, used by the
// CLI, the HTTP server and the tests

pub mod order;      // "<field> <direction>" tokens
pub mod scope;      // limit / skip / order_by from query parameters
pub mod filter;     // per-level optional predicates
pub mod hierarchy;  // table metadata, joins for reads, subqueries for deletes
pub mod cascade;    // create a child only under an existing parent
pub mod store;      // Executor capability + rusqlite session with deadline
pub mod entities;
pub mod db;
pub mod import;
pub mod config;
pub mod logging;
pub mod error;

#[cfg(feature = "server")]
pub mod http;

// Re-export commonly used types
pub use error::{Error, Result};
pub use order::{Direction, OrderBy};
pub use scope::RequestScope;
pub use filter::Filter;
pub use store::{Deadline, Executor, Session};
pub use entities::{
    Category, CategoryFilter, NewCategory,
    Subcategory, SubcategoryFilter, NewSubcategory,
    Unit, UnitFilter, NewUnit,
    find_categories, create_category, delete_categories,
    find_subcategories, create_subcategory, delete_subcategories,
    find_units, create_unit, delete_units,
};
pub use config::Config;
pub use import::{import_csv, ImportReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
