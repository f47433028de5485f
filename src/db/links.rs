//! Relationship rows: student enrollments (`registrations`) and instructor
//! teaching assignments (`instructor_assignments`).

use anyhow::{anyhow, Context, Result};
use log::info;
use rusqlite::{params, Connection};

use crate::models::{Assignment, Course, Instructor, Registration, Student};

use super::courses::course_from_row;
use super::instructors::instructor_from_row;
use super::map_constraint;
use super::students::student_from_row;

/// Enroll a student in a course. Repeated enrollments are stored as separate
/// rows; callers that care about duplicates must check first.
pub fn enroll_student(conn: &Connection, student_id: i64, course_id: i64) -> Result<Registration> {
    conn.execute(
        "INSERT INTO registrations (student_id, course_id) VALUES (?1, ?2)",
        params![student_id, course_id],
    )
    .map_err(|err| map_constraint(err, "Student or course no longer exists."))
    .context("failed to enroll student")?;

    let id = conn.last_insert_rowid();
    info!("event=enroll status=ok student={student_id} course={course_id}");
    Ok(Registration {
        id,
        student_id,
        course_id,
    })
}

/// Assign an instructor to a course, with the same duplicate policy as
/// `enroll_student`.
pub fn assign_instructor(
    conn: &Connection,
    instructor_id: i64,
    course_id: i64,
) -> Result<Assignment> {
    conn.execute(
        "INSERT INTO instructor_assignments (instructor_id, course_id) VALUES (?1, ?2)",
        params![instructor_id, course_id],
    )
    .map_err(|err| map_constraint(err, "Instructor or course no longer exists."))
    .context("failed to assign instructor")?;

    let id = conn.last_insert_rowid();
    info!("event=assign status=ok instructor={instructor_id} course={course_id}");
    Ok(Assignment {
        id,
        instructor_id,
        course_id,
    })
}

/// Drop every enrollment of `student_id` in `course_id`.
pub fn remove_enrollment(conn: &Connection, student_id: i64, course_id: i64) -> Result<usize> {
    let deleted = conn
        .execute(
            "DELETE FROM registrations WHERE student_id = ?1 AND course_id = ?2",
            params![student_id, course_id],
        )
        .context("failed to remove enrollment")?;

    if deleted == 0 {
        Err(anyhow!("Student is not enrolled in this course"))
    } else {
        Ok(deleted)
    }
}

pub fn remove_assignment(conn: &Connection, instructor_id: i64, course_id: i64) -> Result<usize> {
    let deleted = conn
        .execute(
            "DELETE FROM instructor_assignments WHERE instructor_id = ?1 AND course_id = ?2",
            params![instructor_id, course_id],
        )
        .context("failed to remove assignment")?;

    if deleted == 0 {
        Err(anyhow!("Instructor is not assigned to this course"))
    } else {
        Ok(deleted)
    }
}

pub fn fetch_registrations(conn: &Connection) -> Result<Vec<Registration>> {
    let mut stmt = conn
        .prepare("SELECT id, student_id, course_id FROM registrations ORDER BY id")
        .context("failed to prepare registration query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Registration {
                id: row.get(0)?,
                student_id: row.get(1)?,
                course_id: row.get(2)?,
            })
        })
        .context("failed to load registrations")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect registrations")?;

    Ok(rows)
}

pub fn fetch_assignments(conn: &Connection) -> Result<Vec<Assignment>> {
    let mut stmt = conn
        .prepare("SELECT id, instructor_id, course_id FROM instructor_assignments ORDER BY id")
        .context("failed to prepare assignment query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Assignment {
                id: row.get(0)?,
                instructor_id: row.get(1)?,
                course_id: row.get(2)?,
            })
        })
        .context("failed to load assignments")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect assignments")?;

    Ok(rows)
}

/// Courses a student is enrolled in, one entry per registration row.
pub fn courses_for_student(conn: &Connection, student_id: i64) -> Result<Vec<Course>> {
    let mut stmt = conn
        .prepare(
            "SELECT c.id, c.course_id, c.course_name
             FROM courses c
             INNER JOIN registrations r ON r.course_id = c.id
             WHERE r.student_id = ?1
             ORDER BY r.id",
        )
        .context("failed to prepare student courses query")?;

    let courses = stmt
        .query_map([student_id], course_from_row)
        .context("failed to iterate student courses")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect student courses")?;

    Ok(courses)
}

pub fn courses_for_instructor(conn: &Connection, instructor_id: i64) -> Result<Vec<Course>> {
    let mut stmt = conn
        .prepare(
            "SELECT c.id, c.course_id, c.course_name
             FROM courses c
             INNER JOIN instructor_assignments a ON a.course_id = c.id
             WHERE a.instructor_id = ?1
             ORDER BY a.id",
        )
        .context("failed to prepare instructor courses query")?;

    let courses = stmt
        .query_map([instructor_id], course_from_row)
        .context("failed to iterate instructor courses")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect instructor courses")?;

    Ok(courses)
}

pub fn students_in_course(conn: &Connection, course_id: i64) -> Result<Vec<Student>> {
    let mut stmt = conn
        .prepare(
            "SELECT s.id, s.student_id, s.name, s.age, s.email
             FROM students s
             INNER JOIN registrations r ON r.student_id = s.id
             WHERE r.course_id = ?1
             ORDER BY r.id",
        )
        .context("failed to prepare course students query")?;

    let students = stmt
        .query_map([course_id], student_from_row)
        .context("failed to iterate course students")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect course students")?;

    Ok(students)
}

pub fn instructors_for_course(conn: &Connection, course_id: i64) -> Result<Vec<Instructor>> {
    let mut stmt = conn
        .prepare(
            "SELECT i.id, i.instructor_id, i.name, i.age, i.email
             FROM instructors i
             INNER JOIN instructor_assignments a ON a.instructor_id = i.id
             WHERE a.course_id = ?1
             ORDER BY a.id",
        )
        .context("failed to prepare course instructors query")?;

    let instructors = stmt
        .query_map([course_id], instructor_from_row)
        .context("failed to iterate course instructors")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect course instructors")?;

    Ok(instructors)
}
