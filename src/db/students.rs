use anyhow::{anyhow, Context, Result};
use log::info;
use rusqlite::{params, Connection, Row};

use crate::models::{EntityKind, Student};
use crate::validation::PersonDraft;

pub(crate) const STUDENT_COLUMNS: &str = "id, student_id, name, age, email";

pub(crate) fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        student_id: row.get(1)?,
        name: row.get(2)?,
        age: row.get(3)?,
        email: row.get(4)?,
    })
}

/// Every student in insertion order.
pub fn fetch_students(conn: &Connection) -> Result<Vec<Student>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY id"))
        .context("failed to prepare student query")?;

    let students = stmt
        .query_map([], student_from_row)
        .context("failed to load students")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect students")?;

    Ok(students)
}

/// Validate the draft and insert it. A validation failure returns before any
/// SQL runs, so nothing is written.
pub fn add_student(conn: &Connection, draft: &PersonDraft) -> Result<Student> {
    let fields = draft.validate(EntityKind::Student)?;

    conn.execute(
        "INSERT INTO students (student_id, name, age, email) VALUES (?1, ?2, ?3, ?4)",
        params![fields.external_id, fields.name, fields.age, fields.email],
    )
    .context("failed to insert student")?;

    let id = conn.last_insert_rowid();
    info!("event=student_add status=ok id={id}");
    Ok(Student {
        id,
        student_id: fields.external_id,
        name: fields.name,
        age: fields.age,
        email: fields.email,
    })
}

/// Overwrite every editable field of the student with internal id `id`. The
/// row keeps its identity and relationship rows.
pub fn update_student(conn: &Connection, id: i64, draft: &PersonDraft) -> Result<Student> {
    let fields = draft.validate(EntityKind::Student)?;

    let updated = conn
        .execute(
            "UPDATE students SET student_id = ?1, name = ?2, age = ?3, email = ?4 WHERE id = ?5",
            params![fields.external_id, fields.name, fields.age, fields.email, id],
        )
        .context("failed to update student")?;

    if updated == 0 {
        return Err(anyhow!("Student not found"));
    }

    info!("event=student_update status=ok id={id}");
    Ok(Student {
        id,
        student_id: fields.external_id,
        name: fields.name,
        age: fields.age,
        email: fields.email,
    })
}

/// Remove a student together with its registrations, atomically.
pub fn delete_student(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn
        .transaction()
        .context("failed to begin student delete")?;

    let links = tx
        .execute("DELETE FROM registrations WHERE student_id = ?1", params![id])
        .context("failed to delete student registrations")?;

    let deleted = tx
        .execute("DELETE FROM students WHERE id = ?1", params![id])
        .context("failed to delete student")?;

    if deleted == 0 {
        return Err(anyhow!("Student not found"));
    }

    tx.commit().context("failed to commit student delete")?;
    info!("event=student_delete status=ok id={id} registrations_removed={links}");
    Ok(())
}
