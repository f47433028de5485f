use anyhow::{anyhow, Context, Result};
use log::info;
use rusqlite::{params, Connection, Row};

use crate::models::{EntityKind, Instructor};
use crate::validation::PersonDraft;

pub(crate) const INSTRUCTOR_COLUMNS: &str = "id, instructor_id, name, age, email";

pub(crate) fn instructor_from_row(row: &Row<'_>) -> rusqlite::Result<Instructor> {
    Ok(Instructor {
        id: row.get(0)?,
        instructor_id: row.get(1)?,
        name: row.get(2)?,
        age: row.get(3)?,
        email: row.get(4)?,
    })
}

pub fn fetch_instructors(conn: &Connection) -> Result<Vec<Instructor>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructors ORDER BY id"
        ))
        .context("failed to prepare instructor query")?;

    let instructors = stmt
        .query_map([], instructor_from_row)
        .context("failed to load instructors")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect instructors")?;

    Ok(instructors)
}

pub fn add_instructor(conn: &Connection, draft: &PersonDraft) -> Result<Instructor> {
    let fields = draft.validate(EntityKind::Instructor)?;

    conn.execute(
        "INSERT INTO instructors (instructor_id, name, age, email) VALUES (?1, ?2, ?3, ?4)",
        params![fields.external_id, fields.name, fields.age, fields.email],
    )
    .context("failed to insert instructor")?;

    let id = conn.last_insert_rowid();
    info!("event=instructor_add status=ok id={id}");
    Ok(Instructor {
        id,
        instructor_id: fields.external_id,
        name: fields.name,
        age: fields.age,
        email: fields.email,
    })
}

pub fn update_instructor(conn: &Connection, id: i64, draft: &PersonDraft) -> Result<Instructor> {
    let fields = draft.validate(EntityKind::Instructor)?;

    let updated = conn
        .execute(
            "UPDATE instructors SET instructor_id = ?1, name = ?2, age = ?3, email = ?4
             WHERE id = ?5",
            params![fields.external_id, fields.name, fields.age, fields.email, id],
        )
        .context("failed to update instructor")?;

    if updated == 0 {
        return Err(anyhow!("Instructor not found"));
    }

    info!("event=instructor_update status=ok id={id}");
    Ok(Instructor {
        id,
        instructor_id: fields.external_id,
        name: fields.name,
        age: fields.age,
        email: fields.email,
    })
}

/// Remove an instructor and every teaching assignment it holds.
pub fn delete_instructor(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn
        .transaction()
        .context("failed to begin instructor delete")?;

    let links = tx
        .execute(
            "DELETE FROM instructor_assignments WHERE instructor_id = ?1",
            params![id],
        )
        .context("failed to delete instructor assignments")?;

    let deleted = tx
        .execute("DELETE FROM instructors WHERE id = ?1", params![id])
        .context("failed to delete instructor")?;

    if deleted == 0 {
        return Err(anyhow!("Instructor not found"));
    }

    tx.commit().context("failed to commit instructor delete")?;
    info!("event=instructor_delete status=ok id={id} assignments_removed={links}");
    Ok(())
}
