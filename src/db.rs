use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "feesd.sqlite3";

pub fn db_path(workspace: &Path) -> PathBuf {
    workspace.join(DB_FILE_NAME)
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let conn = Connection::open(db_path(workspace))?;

    // One row per storage key; the value is the whole serialized payload.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS slots(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    Ok(conn)
}

pub fn slot_get(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let v = conn
        .query_row("SELECT value FROM slots WHERE key = ?", [key], |r| {
            r.get::<_, String>(0)
        })
        .optional()?;
    Ok(v)
}

pub fn slot_set(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO slots(key, value, updated_at)
         VALUES(?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        (key, value),
    )?;
    Ok(())
}
