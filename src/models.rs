//! Domain models that mirror the SQLite schema. These stay light-weight data
//! holders: validation lives in `validation`, persistence in `db`, and the TUI
//! only ever reads them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three record kinds the store manages. The TUI uses this as its tab
/// selector and the CSV export writes `label()` into the `Type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Student,
    Instructor,
    Course,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Student,
        EntityKind::Instructor,
        EntityKind::Course,
    ];

    /// Singular, capitalized name ("Student").
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Student => "Student",
            EntityKind::Instructor => "Instructor",
            EntityKind::Course => "Course",
        }
    }

    /// Plural name used for tab titles and table names.
    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Student => "Students",
            EntityKind::Instructor => "Instructors",
            EntityKind::Course => "Courses",
        }
    }

    /// Human label for the external identifier field.
    pub fn id_label(self) -> &'static str {
        match self {
            EntityKind::Student => "Student ID",
            EntityKind::Instructor => "Instructor ID",
            EntityKind::Course => "Course ID",
        }
    }

    pub fn index(self) -> usize {
        match self {
            EntityKind::Student => 0,
            EntityKind::Instructor => 1,
            EntityKind::Course => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A row from `students`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Internal row identity. Every update and delete is keyed by this value,
    /// never by the external `student_id`, because the latter is not unique.
    pub id: i64,
    /// User-facing code such as `S1001`.
    pub student_id: String,
    pub name: String,
    pub age: u32,
    pub email: String,
}

/// A row from `instructors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: i64,
    pub instructor_id: String,
    pub name: String,
    pub age: u32,
    pub email: String,
}

/// A row from `courses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    /// User-facing course code such as `CS101`.
    pub course_id: String,
    pub course_name: String,
}

impl fmt::Display for Course {
    /// `CS101 - Intro to Computing`, or just the name when the code is blank.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.course_id.trim().is_empty() {
            write!(f, "{}", self.course_name)
        } else {
            write!(f, "{} - {}", self.course_id, self.course_name)
        }
    }
}

/// Enrollment of one student in one course. Both columns hold internal ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
}

/// Teaching assignment of one instructor to one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub instructor_id: i64,
    pub course_id: i64,
}

/// Full snapshot of the store, shaped exactly like the JSON backup document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    pub students: Vec<Student>,
    pub instructors: Vec<Instructor>,
    pub courses: Vec<Course>,
    pub registrations: Vec<Registration>,
    pub assignments: Vec<Assignment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_cycles_in_both_directions() {
        assert_eq!(EntityKind::Student.next(), EntityKind::Instructor);
        assert_eq!(EntityKind::Course.next(), EntityKind::Student);
        assert_eq!(EntityKind::Student.previous(), EntityKind::Course);
    }

    #[test]
    fn course_display_omits_blank_code() {
        let course = Course {
            id: 1,
            course_id: "  ".into(),
            course_name: "Chemistry".into(),
        };
        assert_eq!(course.to_string(), "Chemistry");
    }
}
