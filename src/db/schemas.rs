use rusqlite::{Connection, Result};

pub(crate) fn initialize_schema(conn: &Connection) -> Result<()> {
    // File-level attributes (format version, producer)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    // One row per profile; counts is the flat little-endian u64 array
    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            length INTEGER NOT NULL,
            total INTEGER NOT NULL,
            non_zero INTEGER NOT NULL,
            mean REAL NOT NULL,
            median REAL NOT NULL,
            std REAL NOT NULL,
            counts BLOB NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_profiles_name
         ON profiles(name)",
        [],
    )?;

    Ok(())
}
