//! Case-insensitive substring search across the three record tables.
//!
//! Every query lowercases the term in Rust, wraps it escaped in `%...%`, and
//! compares it with `LIKE` against `unicode_lower(column)`, so accented and
//! other non-ASCII letters match regardless of case. Correlated `EXISTS` subqueries keep each entity to a
//! single row even when it is linked to several matching courses.

use std::fmt;

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{Connection, Row};

use crate::models::{Course, Instructor, Student};

use super::courses::{course_from_row, fetch_courses, COURSE_COLUMNS};
use super::instructors::{fetch_instructors, instructor_from_row, INSTRUCTOR_COLUMNS};
use super::students::{fetch_students, student_from_row, STUDENT_COLUMNS};

/// Which column(s) the search term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchCriteria {
    /// Student/instructor name and course name.
    #[default]
    Name,
    /// External identifiers of all three record kinds.
    Id,
    /// Course name, reaching students and instructors through their links.
    Course,
}

impl SearchCriteria {
    pub fn label(self) -> &'static str {
        match self {
            SearchCriteria::Name => "Name",
            SearchCriteria::Id => "ID",
            SearchCriteria::Course => "Course",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SearchCriteria::Name => SearchCriteria::Id,
            SearchCriteria::Id => SearchCriteria::Course,
            SearchCriteria::Course => SearchCriteria::Name,
        }
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Matches per record kind, each ordered by internal id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub students: Vec<Student>,
    pub instructors: Vec<Instructor>,
    pub courses: Vec<Course>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.students.len() + self.instructors.len() + self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run `term` against every table using `criteria`. A blank term matches
/// everything.
pub fn search(conn: &Connection, term: &str, criteria: SearchCriteria) -> Result<SearchResults> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(SearchResults {
            students: fetch_students(conn)?,
            instructors: fetch_instructors(conn)?,
            courses: fetch_courses(conn)?,
        });
    }

    let pattern = like_pattern(&term.to_lowercase());

    let student_filter = match criteria {
        SearchCriteria::Name => "unicode_lower(s.name) LIKE ?1 ESCAPE '\\'",
        SearchCriteria::Id => "unicode_lower(s.student_id) LIKE ?1 ESCAPE '\\'",
        SearchCriteria::Course => {
            "EXISTS (SELECT 1 FROM registrations r
                     INNER JOIN courses c ON c.id = r.course_id
                     WHERE r.student_id = s.id AND unicode_lower(c.course_name) LIKE ?1 ESCAPE '\\')"
        }
    };
    let instructor_filter = match criteria {
        SearchCriteria::Name => "unicode_lower(s.name) LIKE ?1 ESCAPE '\\'",
        SearchCriteria::Id => "unicode_lower(s.instructor_id) LIKE ?1 ESCAPE '\\'",
        SearchCriteria::Course => {
            "EXISTS (SELECT 1 FROM instructor_assignments a
                     INNER JOIN courses c ON c.id = a.course_id
                     WHERE a.instructor_id = s.id AND unicode_lower(c.course_name) LIKE ?1 ESCAPE '\\')"
        }
    };
    let course_filter = match criteria {
        SearchCriteria::Id => "unicode_lower(s.course_id) LIKE ?1 ESCAPE '\\'",
        SearchCriteria::Name | SearchCriteria::Course => {
            "unicode_lower(s.course_name) LIKE ?1 ESCAPE '\\'"
        }
    };

    let results = SearchResults {
        students: query_filtered(
            conn,
            "students",
            STUDENT_COLUMNS,
            student_filter,
            &pattern,
            student_from_row,
        )?,
        instructors: query_filtered(
            conn,
            "instructors",
            INSTRUCTOR_COLUMNS,
            instructor_filter,
            &pattern,
            instructor_from_row,
        )?,
        courses: query_filtered(
            conn,
            "courses",
            COURSE_COLUMNS,
            course_filter,
            &pattern,
            course_from_row,
        )?,
    };

    debug!(
        "event=search status=ok criteria={} matches={}",
        criteria.label(),
        results.len()
    );
    Ok(results)
}

/// Shared SELECT for one table aliased as `s`.
fn query_filtered<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    filter: &str,
    pattern: &str,
    map_row: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let columns = columns
        .split(", ")
        .map(|column| format!("s.{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("SELECT {columns} FROM {table} s WHERE {filter} ORDER BY s.id");

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("failed to prepare {table} search"))?;

    let rows = stmt
        .query_map([pattern], map_row)
        .with_context(|| format!("failed to search {table}"))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to collect {table} matches"))?;

    Ok(rows)
}

/// Wrap `term` in `%` wildcards, escaping the characters `LIKE` treats
/// specially so they match literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ada"), "%ada%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\"), "%c:\\\\%");
    }

    #[test]
    fn criteria_cycle() {
        assert_eq!(SearchCriteria::default(), SearchCriteria::Name);
        assert_eq!(SearchCriteria::Name.next(), SearchCriteria::Id);
        assert_eq!(SearchCriteria::Course.next(), SearchCriteria::Name);
    }
}
