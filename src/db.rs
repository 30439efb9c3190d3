use anyhow::Context;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

pub const DB_FILE_NAME: &str = "students.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the store file and ensures the schema exists.
/// Safe to call on every startup; existing rows are never touched.
pub fn open_db(db_path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    // average/grade are a denormalized copy for inspection; reads re-derive them.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            subject_marks_json TEXT NOT NULL,
            average REAL NOT NULL,
            grade TEXT NOT NULL,
            date_added TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create students table")?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_date_added ON students(date_added)",
        [],
    )
    .context("failed to create students index")?;

    Ok(conn)
}

/// Opens an existing store file for a single operation. Never creates it.
pub fn connect(db_path: &Path) -> anyhow::Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

#[cfg(test)]
pub(crate) fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
