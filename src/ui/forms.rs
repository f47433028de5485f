use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Course, EntityKind, Instructor, Student};
use crate::validation::{CourseDraft, PersonDraft};

const PERSON_FIELDS: usize = 4;
const COURSE_FIELDS: usize = 2;

/// Add/edit form shared by all three record kinds. Values are kept as raw
/// text; validation happens when the form is submitted.
#[derive(Clone)]
pub(crate) struct RecordForm {
    pub(crate) kind: EntityKind,
    pub(crate) values: Vec<String>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl RecordForm {
    pub(crate) fn new(kind: EntityKind) -> Self {
        let len = match kind {
            EntityKind::Course => COURSE_FIELDS,
            EntityKind::Student | EntityKind::Instructor => PERSON_FIELDS,
        };
        Self {
            kind,
            values: vec![String::new(); len],
            active: 0,
            error: None,
        }
    }

    pub(crate) fn from_student(student: &Student) -> Self {
        Self::with_values(
            EntityKind::Student,
            vec![
                student.student_id.clone(),
                student.name.clone(),
                student.age.to_string(),
                student.email.clone(),
            ],
        )
    }

    pub(crate) fn from_instructor(instructor: &Instructor) -> Self {
        Self::with_values(
            EntityKind::Instructor,
            vec![
                instructor.instructor_id.clone(),
                instructor.name.clone(),
                instructor.age.to_string(),
                instructor.email.clone(),
            ],
        )
    }

    pub(crate) fn from_course(course: &Course) -> Self {
        Self::with_values(
            EntityKind::Course,
            vec![course.course_id.clone(), course.course_name.clone()],
        )
    }

    fn with_values(kind: EntityKind, values: Vec<String>) -> Self {
        Self {
            kind,
            values,
            active: 0,
            error: None,
        }
    }

    /// Field labels in display order.
    pub(crate) fn labels(&self) -> [&'static str; PERSON_FIELDS] {
        match self.kind {
            EntityKind::Course => ["Course ID", "Course Name", "", ""],
            kind => [kind.id_label(), "Name", "Age", "Email"],
        }
    }

    pub(crate) fn field_count(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % self.field_count();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = (self.active + self.field_count() - 1) % self.field_count();
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.values.get_mut(self.active) {
            Some(value) => {
                value.push(ch);
                true
            }
            None => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(value) = self.values.get_mut(self.active) {
            value.pop();
        }
    }

    fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    pub(crate) fn person_draft(&self) -> PersonDraft {
        PersonDraft::new(self.value(0), self.value(1), self.value(2), self.value(3))
    }

    pub(crate) fn course_draft(&self) -> CourseDraft {
        CourseDraft::new(self.value(0), self.value(1))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let label = self.labels()[index];
        let value = self.value(index);
        let is_active = self.active == index;

        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{label}: ")),
            Span::styled(display, style),
        ])
    }

    /// Column where the cursor belongs on the active line.
    pub(crate) fn cursor_offset(&self) -> usize {
        let label = self.labels()[self.active];
        label.chars().count() + 2 + self.value(self.active).chars().count()
    }
}

/// Record awaiting delete confirmation.
#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) kind: EntityKind,
    pub(crate) id: i64,
    pub(crate) title: String,
}

/// What confirming a row in the course picker does.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkAction {
    Enroll,
    Unenroll,
    Assign,
    Unassign,
}

impl LinkAction {
    pub(crate) fn title(self) -> &'static str {
        match self {
            LinkAction::Enroll => "Enroll in Course",
            LinkAction::Unenroll => "Drop Course",
            LinkAction::Assign => "Assign Course",
            LinkAction::Unassign => "Unassign Course",
        }
    }
}

/// Course picker used to create or remove relationship rows for one student
/// or instructor.
pub(crate) struct LinkPicker {
    pub(crate) action: LinkAction,
    pub(crate) owner_id: i64,
    pub(crate) owner_name: String,
    pub(crate) courses: Vec<Course>,
    pub(crate) selected: usize,
}

impl LinkPicker {
    pub(crate) fn new(
        action: LinkAction,
        owner_id: i64,
        owner_name: String,
        courses: Vec<Course>,
    ) -> Self {
        Self {
            action,
            owner_id,
            owner_name,
            courses,
            selected: 0,
        }
    }

    pub(crate) fn current(&self) -> Option<&Course> {
        self.courses.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.courses.is_empty() {
            return;
        }
        let len = self.courses.len() as isize;
        self.selected = (self.selected as isize + offset).clamp(0, len - 1) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_form_builds_draft_in_field_order() {
        let mut form = RecordForm::new(EntityKind::Student);
        for ch in "S1".chars() {
            form.push_char(ch);
        }
        form.next_field();
        for ch in "Ada".chars() {
            form.push_char(ch);
        }
        form.next_field();
        form.push_char('9');
        form.backspace();
        form.push_char('7');
        form.previous_field();
        form.previous_field();
        assert_eq!(form.active, 0);

        let draft = form.person_draft();
        assert_eq!(draft.external_id, "S1");
        assert_eq!(draft.name, "Ada");
        assert_eq!(draft.age, "7");
        assert_eq!(draft.email, "");
    }

    #[test]
    fn course_form_wraps_focus() {
        let mut form = RecordForm::from_course(&Course {
            id: 3,
            course_id: "CS101".into(),
            course_name: "Intro".into(),
        });
        form.next_field();
        form.next_field();
        assert_eq!(form.active, 0);
        assert_eq!(form.course_draft(), CourseDraft::new("CS101", "Intro"));
        assert_eq!(form.cursor_offset(), "Course ID: CS101".len());
    }
}
