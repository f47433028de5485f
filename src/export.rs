//! Flat CSV listing of every record, one row per entity.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;

use crate::db::{fetch_courses, fetch_instructors, fetch_students};
use crate::models::EntityKind;

pub const CSV_HEADER: [&str; 3] = ["ID", "Name", "Type"];

/// Write `ID,Name,Type` rows (external id, display name, record kind) for
/// students, then instructors, then courses. Returns the number of data rows.
pub fn export_csv<W: Write>(conn: &Connection, writer: W) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)
        .context("failed to write CSV header")?;

    let mut rows = 0;
    for student in fetch_students(conn)? {
        csv.write_record([
            student.student_id.as_str(),
            student.name.as_str(),
            EntityKind::Student.label(),
        ])
        .context("failed to write student row")?;
        rows += 1;
    }
    for instructor in fetch_instructors(conn)? {
        csv.write_record([
            instructor.instructor_id.as_str(),
            instructor.name.as_str(),
            EntityKind::Instructor.label(),
        ])
        .context("failed to write instructor row")?;
        rows += 1;
    }
    for course in fetch_courses(conn)? {
        csv.write_record([
            course.course_id.as_str(),
            course.course_name.as_str(),
            EntityKind::Course.label(),
        ])
        .context("failed to write course row")?;
        rows += 1;
    }

    csv.flush().context("failed to flush CSV output")?;
    Ok(rows)
}

pub fn write_export(conn: &Connection, path: &Path) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("failed to create export file {}", path.display()))?;
    let rows = export_csv(conn, file)?;
    info!("event=csv_export status=ok path={} rows={rows}", path.display());
    Ok(rows)
}
