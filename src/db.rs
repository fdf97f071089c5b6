use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Path that opens a private in-memory database instead of a file.
pub const MEMORY_PATH: &str = ":memory:";

/// Open (creating if needed) the catalog database and make sure the schema exists.
pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    if path.as_os_str() == MEMORY_PATH {
        return open_in_memory();
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    setup_database(&conn)?;

    tracing::debug!(path = %path.display(), "database opened");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Children must always point at an existing parent
    conn.pragma_update(None, "foreign_keys", true)?;
    // Description filters are case-sensitive substring matches
    conn.pragma_update(None, "case_sensitive_like", true)?;

    // ==========================================================================
    // Hierarchy: category → subcategory → unit
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS food_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            description TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS food_subcategories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            description TEXT NOT NULL,
            food_category_id INTEGER NOT NULL REFERENCES food_categories(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS food_units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            description TEXT NOT NULL,
            food_subcategory_id INTEGER NOT NULL REFERENCES food_subcategories(id)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subcategories_category ON food_subcategories(food_category_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_units_subcategory ON food_units(food_subcategory_id)",
        [],
    )?;

    Ok(())
}

/// Number of rows in one of the catalog tables.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))
        .with_context(|| format!("Failed to count rows of {table}"))?;

    Ok(count)
}
