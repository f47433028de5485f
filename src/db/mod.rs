//! Record Store: every SQL statement the application issues lives in one of
//! these submodules, one per table family.

mod connection;
mod courses;
mod instructors;
mod links;
mod search;
mod students;

use anyhow::anyhow;
use rusqlite::{Error as SqlError, ErrorCode};

pub use connection::{ensure_schema, open, open_in_memory};
pub use courses::{add_course, delete_course, fetch_courses, update_course};
pub use instructors::{add_instructor, delete_instructor, fetch_instructors, update_instructor};
pub use links::{
    assign_instructor, courses_for_instructor, courses_for_student, enroll_student,
    fetch_assignments, fetch_registrations, instructors_for_course, remove_assignment,
    remove_enrollment, students_in_course,
};
pub use search::{search, SearchCriteria, SearchResults};
pub use students::{add_student, delete_student, fetch_students, update_student};

/// Turn SQLite constraint failures into a message the user can act on; any
/// other error passes through untouched.
pub(crate) fn map_constraint(err: SqlError, message: &str) -> anyhow::Error {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        anyhow!("{message}")
    } else {
        err.into()
    }
}
