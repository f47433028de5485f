//! Input validation for the add/edit forms. Everything here runs before any
//! SQL is issued, so a rejected draft never touches the database.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::EntityKind;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Reasons a form submission is rejected. The display strings are shown to the
/// user verbatim in the status footer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required.")]
    Required { field: &'static str },
    #[error("Invalid age `{0}`: age must be a whole number.")]
    InvalidAge(String),
    #[error("Invalid age: age cannot be negative.")]
    NegativeAge,
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),
}

/// Trim `value` and reject it when nothing is left.
pub fn require(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required { field })
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse a non-negative integer age from raw form text.
pub fn parse_age(raw: &str) -> Result<u32, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field: "Age" });
    }
    let age = trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidAge(trimmed.to_string()))?;
    if age < 0 {
        return Err(ValidationError::NegativeAge);
    }
    u32::try_from(age).map_err(|_| ValidationError::InvalidAge(trimmed.to_string()))
}

pub fn is_valid_email(raw: &str) -> bool {
    EMAIL_RE.is_match(raw.trim())
}

/// Trim and check an email address against the accepted format.
pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field: "Email" });
    }
    if is_valid_email(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidEmail(trimmed.to_string()))
    }
}

/// Raw text for a student or instructor as typed into a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonDraft {
    pub external_id: String,
    pub name: String,
    pub age: String,
    pub email: String,
}

/// A person draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonFields {
    pub external_id: String,
    pub name: String,
    pub age: u32,
    pub email: String,
}

impl PersonDraft {
    pub fn new(external_id: &str, name: &str, age: &str, email: &str) -> Self {
        Self {
            external_id: external_id.to_string(),
            name: name.to_string(),
            age: age.to_string(),
            email: email.to_string(),
        }
    }

    /// Check fields in form order so the first problem the user sees is the
    /// topmost one. `kind` only names the identifier field in messages.
    pub fn validate(&self, kind: EntityKind) -> Result<PersonFields, ValidationError> {
        let external_id = require(kind.id_label(), &self.external_id)?;
        let name = require("Name", &self.name)?;
        let age = parse_age(&self.age)?;
        let email = validate_email(&self.email)?;
        Ok(PersonFields {
            external_id,
            name,
            age,
            email,
        })
    }
}

/// Raw text for a course form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseDraft {
    pub course_id: String,
    pub course_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFields {
    pub course_id: String,
    pub course_name: String,
}

impl CourseDraft {
    pub fn new(course_id: &str, course_name: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            course_name: course_name.to_string(),
        }
    }

    pub fn validate(&self) -> Result<CourseFields, ValidationError> {
        Ok(CourseFields {
            course_id: require("Course ID", &self.course_id)?,
            course_name: require("Course Name", &self.course_name)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_must_be_a_non_negative_integer() {
        assert_eq!(parse_age(" 21 "), Ok(21));
        assert_eq!(parse_age("0"), Ok(0));
        assert_eq!(parse_age("-1"), Err(ValidationError::NegativeAge));
        assert_eq!(
            parse_age("abc"),
            Err(ValidationError::InvalidAge("abc".into()))
        );
        assert_eq!(
            parse_age("4.5"),
            Err(ValidationError::InvalidAge("4.5".into()))
        );
        assert_eq!(
            parse_age(""),
            Err(ValidationError::Required { field: "Age" })
        );
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@school.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b.c"));
        assert!(!is_valid_email("a b@school.org"));
        assert_eq!(
            validate_email("not-an-email"),
            Err(ValidationError::InvalidEmail("not-an-email".into()))
        );
    }

    #[test]
    fn person_draft_reports_first_missing_field() {
        let draft = PersonDraft::new("", "", "", "");
        assert_eq!(
            draft.validate(EntityKind::Instructor),
            Err(ValidationError::Required {
                field: "Instructor ID"
            })
        );

        let draft = PersonDraft::new("S1", "  ", "20", "a@b.co");
        assert_eq!(
            draft.validate(EntityKind::Student),
            Err(ValidationError::Required { field: "Name" })
        );
    }

    #[test]
    fn person_draft_trims_values() {
        let fields = PersonDraft::new(" S1 ", " Ada ", " 36 ", " ada@school.org ")
            .validate(EntityKind::Student)
            .unwrap();
        assert_eq!(fields.external_id, "S1");
        assert_eq!(fields.name, "Ada");
        assert_eq!(fields.age, 36);
        assert_eq!(fields.email, "ada@school.org");
    }

    #[test]
    fn course_draft_requires_both_fields() {
        assert_eq!(
            CourseDraft::new("CS101", "").validate(),
            Err(ValidationError::Required {
                field: "Course Name"
            })
        );
        assert!(CourseDraft::new("CS101", "Intro").validate().is_ok());
    }
}
