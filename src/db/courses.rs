use anyhow::{anyhow, Context, Result};
use log::info;
use rusqlite::{params, Connection, Row};

use crate::models::Course;
use crate::validation::CourseDraft;

pub(crate) const COURSE_COLUMNS: &str = "id, course_id, course_name";

pub(crate) fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        course_id: row.get(1)?,
        course_name: row.get(2)?,
    })
}

pub fn fetch_courses(conn: &Connection) -> Result<Vec<Course>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY id"))
        .context("failed to prepare course query")?;

    let courses = stmt
        .query_map([], course_from_row)
        .context("failed to load courses")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect courses")?;

    Ok(courses)
}

pub fn add_course(conn: &Connection, draft: &CourseDraft) -> Result<Course> {
    let fields = draft.validate()?;

    conn.execute(
        "INSERT INTO courses (course_id, course_name) VALUES (?1, ?2)",
        params![fields.course_id, fields.course_name],
    )
    .context("failed to insert course")?;

    let id = conn.last_insert_rowid();
    info!("event=course_add status=ok id={id}");
    Ok(Course {
        id,
        course_id: fields.course_id,
        course_name: fields.course_name,
    })
}

pub fn update_course(conn: &Connection, id: i64, draft: &CourseDraft) -> Result<Course> {
    let fields = draft.validate()?;

    let updated = conn
        .execute(
            "UPDATE courses SET course_id = ?1, course_name = ?2 WHERE id = ?3",
            params![fields.course_id, fields.course_name, id],
        )
        .context("failed to update course")?;

    if updated == 0 {
        return Err(anyhow!("Course not found"));
    }

    info!("event=course_update status=ok id={id}");
    Ok(Course {
        id,
        course_id: fields.course_id,
        course_name: fields.course_name,
    })
}

/// Remove a course and both kinds of relationship rows pointing at it.
pub fn delete_course(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction().context("failed to begin course delete")?;

    let registrations = tx
        .execute("DELETE FROM registrations WHERE course_id = ?1", params![id])
        .context("failed to delete course registrations")?;

    let assignments = tx
        .execute(
            "DELETE FROM instructor_assignments WHERE course_id = ?1",
            params![id],
        )
        .context("failed to delete course assignments")?;

    let deleted = tx
        .execute("DELETE FROM courses WHERE id = ?1", params![id])
        .context("failed to delete course")?;

    if deleted == 0 {
        return Err(anyhow!("Course not found"));
    }

    tx.commit().context("failed to commit course delete")?;
    info!(
        "event=course_delete status=ok id={id} registrations_removed={registrations} assignments_removed={assignments}"
    );
    Ok(())
}
