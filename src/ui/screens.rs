use crate::models::{Course, Instructor, Student};

/// A list of records plus the highlighted row. Each tab owns one.
pub(crate) struct RecordList<T> {
    pub(crate) items: Vec<T>,
    pub(crate) selected: usize,
}

impl<T> RecordList<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self { items, selected: 0 }
    }

    pub(crate) fn current(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.items.is_empty() {
            return;
        }
        let len = self.items.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    /// Swap in fresh rows, moving the highlight to `focus` when it is given
    /// and otherwise keeping the old position in bounds.
    pub(crate) fn set_items(&mut self, items: Vec<T>, focus: Option<usize>) {
        self.items = items;
        if let Some(index) = focus {
            self.selected = index;
        }
        self.ensure_in_bounds();
    }

    fn ensure_in_bounds(&mut self) {
        if self.items.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.items.len() {
            self.selected = self.items.len() - 1;
        }
    }
}

/// Column headers and cell text for the record table of each kind.
pub(crate) trait TableRecord {
    const HEADERS: &'static [&'static str];
    fn id(&self) -> i64;
    fn cells(&self) -> Vec<String>;
    fn title(&self) -> String;
}

impl TableRecord for Student {
    const HEADERS: &'static [&'static str] = &["Student ID", "Name", "Age", "Email"];

    fn id(&self) -> i64 {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.student_id.clone(),
            self.name.clone(),
            self.age.to_string(),
            self.email.clone(),
        ]
    }

    fn title(&self) -> String {
        format!("{} ({})", self.name, self.student_id)
    }
}

impl TableRecord for Instructor {
    const HEADERS: &'static [&'static str] = &["Instructor ID", "Name", "Age", "Email"];

    fn id(&self) -> i64 {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.instructor_id.clone(),
            self.name.clone(),
            self.age.to_string(),
            self.email.clone(),
        ]
    }

    fn title(&self) -> String {
        format!("{} ({})", self.name, self.instructor_id)
    }
}

impl TableRecord for Course {
    const HEADERS: &'static [&'static str] = &["Course ID", "Course Name"];

    fn id(&self) -> i64 {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![self.course_id.clone(), self.course_name.clone()]
    }

    fn title(&self) -> String {
        self.to_string()
    }
}

/// Index of the record with internal id `id`, if present.
pub(crate) fn position_of<T: TableRecord>(items: &[T], id: Option<i64>) -> Option<usize> {
    let id = id?;
    items.iter().position(|item| item.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: i64) -> Course {
        Course {
            id,
            course_id: format!("C{id}"),
            course_name: format!("Course {id}"),
        }
    }

    #[test]
    fn selection_is_clamped() {
        let mut list = RecordList::new(vec![course(1), course(2), course(3)]);
        list.move_selection(10);
        assert_eq!(list.selected, 2);
        list.move_selection(-10);
        assert_eq!(list.selected, 0);
        list.select_last();
        assert_eq!(list.current().map(|c| c.id), Some(3));
    }

    #[test]
    fn set_items_keeps_selection_in_bounds() {
        let mut list = RecordList::new(vec![course(1), course(2), course(3)]);
        list.select_last();
        list.set_items(vec![course(1)], None);
        assert_eq!(list.selected, 0);

        let items = vec![course(4), course(5)];
        let focus = position_of(&items, Some(5));
        list.set_items(items, focus);
        assert_eq!(list.current().map(|c| c.id), Some(5));

        list.set_items(Vec::new(), None);
        assert!(list.current().is_none());
    }
}
