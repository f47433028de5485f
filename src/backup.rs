//! JSON backup and restore of the whole store.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use rusqlite::{params, Connection};

use crate::db::{
    fetch_assignments, fetch_courses, fetch_instructors, fetch_registrations, fetch_students,
    map_constraint,
};
use crate::models::Backup;

const MISSING_LINK_TARGET: &str = "Backup references a missing student, instructor or course.";

/// Read every table into memory.
pub fn snapshot(conn: &Connection) -> Result<Backup> {
    Ok(Backup {
        students: fetch_students(conn)?,
        instructors: fetch_instructors(conn)?,
        courses: fetch_courses(conn)?,
        registrations: fetch_registrations(conn)?,
        assignments: fetch_assignments(conn)?,
    })
}

/// Write a pretty-printed JSON backup to `path`. The document is written to a
/// sibling `.tmp` file first and renamed over `path` only once complete, so
/// the previous backup survives a failed write.
pub fn write_backup(conn: &Connection, path: &Path) -> Result<Backup> {
    let backup = snapshot(conn)?;

    let staging = staging_path(path);
    if let Err(err) = write_json(&staging, &backup) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    fs::rename(&staging, path)
        .with_context(|| format!("failed to replace backup file {}", path.display()))?;

    info!(
        "event=backup_write status=ok path={} students={} instructors={} courses={}",
        path.display(),
        backup.students.len(),
        backup.instructors.len(),
        backup.courses.len()
    );
    Ok(backup)
}

fn write_json(path: &Path, backup: &Backup) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create backup file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, backup).context("failed to serialize backup")?;
    writer.flush().context("failed to flush backup file")?;
    writer
        .get_ref()
        .sync_all()
        .context("failed to sync backup file")
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn read_backup(path: &Path) -> Result<Backup> {
    let file = File::open(path)
        .with_context(|| format!("failed to open backup file {}", path.display()))?;
    let backup = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse backup file {}", path.display()))?;
    Ok(backup)
}

/// Replace the contents of every table with `backup`, keeping the original
/// internal ids so relationship rows stay valid. Either every row lands or the
/// store is left as it was.
pub fn restore(conn: &mut Connection, backup: &Backup) -> Result<()> {
    let tx = conn.transaction().context("failed to begin restore")?;

    for table in [
        "registrations",
        "instructor_assignments",
        "students",
        "instructors",
        "courses",
    ] {
        tx.execute(&format!("DELETE FROM {table}"), [])
            .with_context(|| format!("failed to clear {table}"))?;
    }

    for course in &backup.courses {
        tx.execute(
            "INSERT INTO courses (id, course_id, course_name) VALUES (?1, ?2, ?3)",
            params![course.id, course.course_id, course.course_name],
        )
        .context("failed to restore course")?;
    }

    for student in &backup.students {
        tx.execute(
            "INSERT INTO students (id, student_id, name, age, email) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                student.id,
                student.student_id,
                student.name,
                student.age,
                student.email
            ],
        )
        .context("failed to restore student")?;
    }

    for instructor in &backup.instructors {
        tx.execute(
            "INSERT INTO instructors (id, instructor_id, name, age, email)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                instructor.id,
                instructor.instructor_id,
                instructor.name,
                instructor.age,
                instructor.email
            ],
        )
        .context("failed to restore instructor")?;
    }

    for registration in &backup.registrations {
        tx.execute(
            "INSERT INTO registrations (id, student_id, course_id) VALUES (?1, ?2, ?3)",
            params![
                registration.id,
                registration.student_id,
                registration.course_id
            ],
        )
        .map_err(|err| map_constraint(err, MISSING_LINK_TARGET))
        .context("failed to restore registration")?;
    }

    for assignment in &backup.assignments {
        tx.execute(
            "INSERT INTO instructor_assignments (id, instructor_id, course_id) VALUES (?1, ?2, ?3)",
            params![
                assignment.id,
                assignment.instructor_id,
                assignment.course_id
            ],
        )
        .map_err(|err| map_constraint(err, MISSING_LINK_TARGET))
        .context("failed to restore assignment")?;
    }

    tx.commit().context("failed to commit restore")?;
    info!(
        "event=backup_restore status=ok students={} instructors={} courses={} registrations={} assignments={}",
        backup.students.len(),
        backup.instructors.len(),
        backup.courses.len(),
        backup.registrations.len(),
        backup.assignments.len()
    );
    Ok(())
}
