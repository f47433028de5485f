use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Open (or create) the database file at `path` and make sure every table
/// exists. The returned connection is the only one the application uses; it
/// is released when the owner drops it.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database at {}", path.display()))?;
    ensure_schema(&conn)?;
    info!("event=db_open status=ok mode=file path={}", path.display());
    Ok(conn)
}

/// In-memory store with the full schema, used by tests and tooling.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Run the lazy migrations. `PRAGMA foreign_keys = ON` makes SQLite reject
/// relationship rows that point at missing students, instructors or courses.
/// None of the foreign keys cascade: parent deletes clear their relationship
/// rows explicitly.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;
    register_functions(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id TEXT NOT NULL,
            name TEXT NOT NULL,
            age INTEGER NOT NULL CHECK (age >= 0),
            email TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create students table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS instructors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instructor_id TEXT NOT NULL,
            name TEXT NOT NULL,
            age INTEGER NOT NULL CHECK (age >= 0),
            email TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create instructors table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id TEXT NOT NULL,
            course_name TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create courses table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS registrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            course_id INTEGER NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )
    .context("failed to create registrations table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS instructor_assignments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instructor_id INTEGER NOT NULL,
            course_id INTEGER NOT NULL,
            FOREIGN KEY(instructor_id) REFERENCES instructors(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )
    .context("failed to create instructor_assignments table")?;

    Ok(())
}

/// SQL name of the Unicode-aware lowercase function. The built-in `lower()`
/// and `LIKE` only fold ASCII letters.
const UNICODE_LOWER: &str = "unicode_lower";

fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|text| text.to_lowercase()))
        },
    )
    .context("failed to register unicode_lower")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicode_lower_folds_beyond_ascii() {
        let conn = open_in_memory().unwrap();
        let lowered: String = conn
            .query_row("SELECT unicode_lower('ÉMILE ZOË')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(lowered, "émile zoë");

        let null: Option<String> = conn
            .query_row("SELECT unicode_lower(NULL)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(null, None);
    }
}
