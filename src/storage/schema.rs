//! Database schema definitions
//!
//! The `cursos` table keeps the column layout of the databases already in
//! use by earlier deployments of the watcher, so an existing `cursos.db` can
//! be opened as-is. Run bookkeeping lives in its own table.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every course ever announced, keyed by detail-page address
CREATE TABLE IF NOT EXISTS cursos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT UNIQUE,
    titulo TEXT,
    lugar TEXT,
    periodo TEXT,
    hora TEXT,
    plazas TEXT,
    costo TEXT
);

-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_fetched INTEGER NOT NULL DEFAULT 0,
    pages_failed INTEGER NOT NULL DEFAULT 0,
    new_courses INTEGER NOT NULL DEFAULT 0
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
