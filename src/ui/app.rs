use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use log::warn;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs,
    Wrap,
};
use ratatui::Frame;
use rusqlite::Connection;

use crate::backup::{read_backup, restore, write_backup};
use crate::config::AppPaths;
use crate::db::{
    add_course, add_instructor, add_student, assign_instructor, courses_for_instructor,
    courses_for_student, delete_course, delete_instructor, delete_student, enroll_student,
    fetch_courses, fetch_instructors, fetch_students, instructors_for_course, remove_assignment,
    remove_enrollment, search, students_in_course, update_course, update_instructor,
    update_student, SearchCriteria,
};
use crate::export::write_export;
use crate::models::{Course, EntityKind, Instructor, Student};

use super::forms::{ConfirmDelete, LinkAction, LinkPicker, RecordForm};
use super::helpers::{centered_rect, key_hints, surface_error};
use super::screens::{position_of, RecordList, TableRecord};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const TAB_BAR_HEIGHT: u16 = 3;
const PAGE: isize = 5;

/// Fine-grained modes layered over the current tab.
enum Mode {
    Normal,
    Adding(RecordForm),
    Editing { id: i64, form: RecordForm },
    ConfirmDelete(ConfirmDelete),
    Linking(LinkPicker),
    ConfirmRestore,
    Searching(SearchState),
}

/// Term and criteria of the search bar. Once submitted it stays applied to
/// every reload until cleared with Esc.
#[derive(Clone, Default)]
struct SearchState {
    query: String,
    criteria: SearchCriteria,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state. The connection and every piece of view state
/// live here and are handed to the Record Store explicitly.
pub struct App {
    conn: Connection,
    paths: AppPaths,
    tab: EntityKind,
    students: RecordList<Student>,
    instructors: RecordList<Instructor>,
    courses: RecordList<Course>,
    detail: Vec<String>,
    filter: Option<SearchState>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(conn: Connection, paths: AppPaths) -> Result<Self> {
        let students = fetch_students(&conn)?;
        let instructors = fetch_instructors(&conn)?;
        let courses = fetch_courses(&conn)?;

        let mut app = Self {
            conn,
            paths,
            tab: EntityKind::Student,
            students: RecordList::new(students),
            instructors: RecordList::new(instructors),
            courses: RecordList::new(courses),
            detail: Vec::new(),
            filter: None,
            mode: Mode::Normal,
            status: None,
        };
        app.refresh_detail()?;
        Ok(app)
    }

    /// Route a key press to the active mode. Returns `true` when the user
    /// asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        let next = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Adding(form) => Ok(self.handle_form(code, None, form)),
            Mode::Editing { id, form } => Ok(self.handle_form(code, Some(id), form)),
            Mode::ConfirmDelete(confirm) => Ok(self.handle_confirm_delete(code, confirm)),
            Mode::Linking(picker) => Ok(self.handle_link_picker(code, picker)),
            Mode::ConfirmRestore => Ok(self.handle_confirm_restore(code)),
            Mode::Searching(state) => Ok(self.handle_search(code, state)),
        };

        // A failed refresh must not take the whole UI down with it.
        self.mode = match next {
            Ok(mode) => mode,
            Err(err) => {
                self.report_error(&err);
                Mode::Normal
            }
        };
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.filter.take().is_some() {
                    self.reload(None)?;
                    self.set_status("Search cleared.", StatusKind::Info);
                }
            }
            KeyCode::Tab | KeyCode::Right => self.switch_tab(self.tab.next())?,
            KeyCode::BackTab | KeyCode::Left => self.switch_tab(self.tab.previous())?,
            KeyCode::Char('1') => self.switch_tab(EntityKind::Student)?,
            KeyCode::Char('2') => self.switch_tab(EntityKind::Instructor)?,
            KeyCode::Char('3') => self.switch_tab(EntityKind::Course)?,
            KeyCode::Up => self.move_selection(-1)?,
            KeyCode::Down => self.move_selection(1)?,
            KeyCode::PageUp => self.move_selection(-PAGE)?,
            KeyCode::PageDown => self.move_selection(PAGE)?,
            KeyCode::Home => self.select_edge(true)?,
            KeyCode::End => self.select_edge(false)?,
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::Adding(RecordForm::new(self.tab)));
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some((id, form)) = self.edit_form() {
                    self.clear_status();
                    return Ok(Mode::Editing { id, form });
                }
                self.no_selection("edit");
            }
            KeyCode::Char('-') | KeyCode::Char('d') => {
                if let Some(confirm) = self.delete_target() {
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                }
                self.no_selection("delete");
            }
            KeyCode::Char('l') => return self.open_link_picker(true),
            KeyCode::Char('u') => return self.open_link_picker(false),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                return Ok(Mode::Searching(self.filter.clone().unwrap_or_default()));
            }
            KeyCode::Char('b') => match write_backup(&self.conn, &self.paths.backup()) {
                Ok(backup) => self.set_status(
                    format!(
                        "Backup saved to {} ({} students, {} instructors, {} courses).",
                        self.paths.backup().display(),
                        backup.students.len(),
                        backup.instructors.len(),
                        backup.courses.len()
                    ),
                    StatusKind::Info,
                ),
                Err(err) => self.report_error(&err),
            },
            KeyCode::Char('x') => match write_export(&self.conn, &self.paths.export()) {
                Ok(rows) => self.set_status(
                    format!("Exported {rows} records to {}.", self.paths.export().display()),
                    StatusKind::Info,
                ),
                Err(err) => self.report_error(&err),
            },
            KeyCode::Char('R') => {
                if self.paths.backup().exists() {
                    self.clear_status();
                    return Ok(Mode::ConfirmRestore);
                }
                self.set_status("No backup file to restore yet.", StatusKind::Error);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_form(&mut self, code: KeyCode, id: Option<i64>, mut form: RecordForm) -> Mode {
        match code {
            KeyCode::Esc => {
                let message = if id.is_some() {
                    "Edit cancelled."
                } else {
                    "Add cancelled."
                };
                self.set_status(message, StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_form(id, &form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        match id {
            Some(id) => Mode::Editing { id, form },
            None => Mode::Adding(form),
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(()) => Mode::Normal,
                    Err(err) => {
                        self.report_error(&err);
                        Mode::ConfirmDelete(confirm)
                    }
                }
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_link_picker(&mut self, code: KeyCode, mut picker: LinkPicker) -> Mode {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                return Mode::Normal;
            }
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::PageUp => picker.move_selection(-PAGE),
            KeyCode::PageDown => picker.move_selection(PAGE),
            KeyCode::Enter => {
                let Some(course) = picker.current().cloned() else {
                    self.set_status("No course selected.", StatusKind::Error);
                    return Mode::Linking(picker);
                };
                match self.apply_link(&picker, &course) {
                    Ok(()) => return Mode::Normal,
                    Err(err) => self.report_error(&err),
                }
            }
            _ => {}
        }
        Mode::Linking(picker)
    }

    fn handle_confirm_restore(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Err(err) = self.perform_restore() {
                    self.report_error(&err);
                }
                Mode::Normal
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Restore cancelled.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::ConfirmRestore,
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.filter = None;
                if let Err(err) = self.reload(None) {
                    self.report_error(&err);
                } else {
                    self.set_status("Search cleared.", StatusKind::Info);
                }
                return Mode::Normal;
            }
            KeyCode::Enter => {
                if state.query.trim().is_empty() {
                    self.filter = None;
                }
                return Mode::Normal;
            }
            KeyCode::Tab => state.criteria = state.criteria.next(),
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => return Mode::Searching(state),
        }

        // Results follow every keystroke.
        self.filter = Some(state.clone());
        if let Err(err) = self.reload(None) {
            self.report_error(&err);
        } else {
            let found = self.students.items.len()
                + self.instructors.items.len()
                + self.courses.items.len();
            self.set_status(
                format!("{found} matching records by {}.", state.criteria),
                StatusKind::Info,
            );
        }
        Mode::Searching(state)
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TAB_BAR_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);

        match self.tab {
            EntityKind::Student => self.draw_records(frame, body[0], &self.students),
            EntityKind::Instructor => self.draw_records(frame, body[0], &self.instructors),
            EntityKind::Course => self.draw_records(frame, body[0], &self.courses),
        }
        self.draw_detail(frame, body[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Adding(form) => {
                self.draw_form(frame, area, &format!("Add {}", form.kind), form)
            }
            Mode::Editing { form, .. } => {
                self.draw_form(frame, area, &format!("Edit {}", form.kind), form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Linking(picker) => self.draw_link_picker(frame, area, picker),
            Mode::ConfirmRestore => self.draw_confirm_restore(frame, area),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles = EntityKind::ALL
            .iter()
            .enumerate()
            .map(|(idx, kind)| format!("{} {}", idx + 1, kind.plural()))
            .collect::<Vec<_>>();
        let tabs = Tabs::new(titles)
            .select(self.tab.index())
            .block(Block::default().borders(Borders::ALL).title("School Records"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_records<T: TableRecord>(&self, frame: &mut Frame, area: Rect, list: &RecordList<T>) {
        let title = match &self.filter {
            Some(filter) if !filter.query.trim().is_empty() => format!(
                "{} matching \"{}\" by {}",
                self.tab.plural(),
                filter.query.trim(),
                filter.criteria
            ),
            _ => self.tab.plural().to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if list.is_empty() {
            let message = if self.filter.is_some() {
                format!("No {} match the search.", self.tab.plural().to_lowercase())
            } else {
                format!(
                    "No {} yet. Press '+' to add one.",
                    self.tab.plural().to_lowercase()
                )
            };
            let paragraph = Paragraph::new(message)
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let header = Row::new(T::HEADERS.iter().copied()).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let rows = list.items.iter().map(|item| Row::new(item.cells()));
        let widths = column_widths(T::HEADERS.len());

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(Some(list.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect) {
        let lines = if self.detail.is_empty() {
            vec![Line::from(Span::styled(
                "Nothing selected.",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.detail.iter().cloned().map(Line::from).collect()
        };
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match &self.mode {
            Mode::Adding(_) | Mode::Editing { .. } => key_hints(&[
                ("Enter", "Save"),
                ("Tab", "Next field"),
                ("Esc", "Cancel"),
            ]),
            Mode::ConfirmDelete(_) | Mode::ConfirmRestore => {
                key_hints(&[("Y", "Confirm"), ("N/Esc", "Cancel")])
            }
            Mode::Linking(_) => key_hints(&[
                ("Up/Down", "Navigate"),
                ("Enter", "Apply"),
                ("Esc", "Cancel"),
            ]),
            Mode::Searching(_) => key_hints(&[
                ("Tab", "Criteria"),
                ("Enter", "Keep results"),
                ("Esc", "Clear"),
            ]),
            Mode::Normal => match self.tab {
                EntityKind::Course => key_hints(&[
                    ("Tab", "Switch"),
                    ("+", "Add"),
                    ("e", "Edit"),
                    ("-", "Delete"),
                    ("f", "Search"),
                    ("b", "Backup"),
                    ("x", "Export"),
                    ("R", "Restore"),
                    ("q", "Quit"),
                ]),
                _ => key_hints(&[
                    ("Tab", "Switch"),
                    ("+", "Add"),
                    ("e", "Edit"),
                    ("-", "Delete"),
                    ("l", "Link course"),
                    ("u", "Unlink"),
                    ("f", "Search"),
                    ("b", "Backup"),
                    ("x", "Export"),
                    ("R", "Restore"),
                    ("q", "Quit"),
                ]),
            },
        }
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &RecordForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = (0..form.field_count())
            .map(|index| form.build_line(index))
            .collect::<Vec<_>>();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save | Tab to switch | Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + form.cursor_offset() as u16;
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let consequence = match confirm.kind {
            EntityKind::Student => "Their course enrollments are removed as well.",
            EntityKind::Instructor => "Their teaching assignments are removed as well.",
            EntityKind::Course => "All enrollments and teaching assignments are removed as well.",
        };

        let lines = vec![
            Line::from(format!("Delete {} {}?", confirm.kind, confirm.title)),
            Line::from(consequence),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_restore(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Restore Backup")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Replace every record with {}?",
                self.paths.backup().display()
            )),
            Line::from("Records added since that backup will be lost."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_link_picker(&self, frame: &mut Frame, area: Rect, picker: &LinkPicker) {
        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let title = format!("{}: {}", picker.action.title(), picker.owner_name);
        let block = Block::default().title(title).borders(Borders::ALL);

        if picker.courses.is_empty() {
            let message = match picker.action {
                LinkAction::Enroll | LinkAction::Assign => "No courses yet. Add one first.",
                LinkAction::Unenroll | LinkAction::Unassign => "No linked courses.",
            };
            let paragraph = Paragraph::new(message)
                .block(block)
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, popup_area);
            return;
        }

        let items = picker
            .courses
            .iter()
            .map(|course| ListItem::new(course.to_string()))
            .collect::<Vec<_>>();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(picker.selected));
        frame.render_stateful_widget(list, popup_area, &mut state);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let title = format!("Search by {} (Tab to change)", state.criteria);
        let block = Block::default().borders(Borders::ALL).title(title);
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn report_error(&mut self, err: &anyhow::Error) {
        warn!("event=ui_action status=error error={err:#}");
        self.set_status(surface_error(err), StatusKind::Error);
    }

    fn no_selection(&mut self, action: &str) {
        self.set_status(
            format!(
                "No {} selected to {action}.",
                self.tab.label().to_lowercase()
            ),
            StatusKind::Error,
        );
    }

    fn save_form(&mut self, id: Option<i64>, form: &RecordForm) -> Result<()> {
        let (saved_id, name) = match (form.kind, id) {
            (EntityKind::Student, None) => {
                let student = add_student(&self.conn, &form.person_draft())?;
                (student.id, student.name)
            }
            (EntityKind::Student, Some(id)) => {
                let student = update_student(&self.conn, id, &form.person_draft())?;
                (student.id, student.name)
            }
            (EntityKind::Instructor, None) => {
                let instructor = add_instructor(&self.conn, &form.person_draft())?;
                (instructor.id, instructor.name)
            }
            (EntityKind::Instructor, Some(id)) => {
                let instructor = update_instructor(&self.conn, id, &form.person_draft())?;
                (instructor.id, instructor.name)
            }
            (EntityKind::Course, None) => {
                let course = add_course(&self.conn, &form.course_draft())?;
                (course.id, course.course_name)
            }
            (EntityKind::Course, Some(id)) => {
                let course = update_course(&self.conn, id, &form.course_draft())?;
                (course.id, course.course_name)
            }
        };

        self.reload(Some(saved_id))?;
        let verb = if id.is_some() { "updated" } else { "added" };
        self.set_status(
            format!("{} {verb}: {name}.", form.kind),
            StatusKind::Info,
        );
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) -> Result<()> {
        match confirm.kind {
            EntityKind::Student => delete_student(&mut self.conn, confirm.id)?,
            EntityKind::Instructor => delete_instructor(&mut self.conn, confirm.id)?,
            EntityKind::Course => delete_course(&mut self.conn, confirm.id)?,
        }
        self.reload(None)?;
        self.set_status(
            format!("{} deleted: {}.", confirm.kind, confirm.title),
            StatusKind::Info,
        );
        Ok(())
    }

    fn apply_link(&mut self, picker: &LinkPicker, course: &Course) -> Result<()> {
        let message = match picker.action {
            LinkAction::Enroll => {
                enroll_student(&self.conn, picker.owner_id, course.id)?;
                format!("Enrolled {} in {}.", picker.owner_name, course.course_name)
            }
            LinkAction::Unenroll => {
                remove_enrollment(&self.conn, picker.owner_id, course.id)?;
                format!("Dropped {} from {}.", picker.owner_name, course.course_name)
            }
            LinkAction::Assign => {
                assign_instructor(&self.conn, picker.owner_id, course.id)?;
                format!("Assigned {} to {}.", picker.owner_name, course.course_name)
            }
            LinkAction::Unassign => {
                remove_assignment(&self.conn, picker.owner_id, course.id)?;
                format!(
                    "Unassigned {} from {}.",
                    picker.owner_name, course.course_name
                )
            }
        };
        // Course-criteria searches depend on links, so refresh the lists too.
        self.reload(Some(picker.owner_id))?;
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn perform_restore(&mut self) -> Result<()> {
        let path = self.paths.backup();
        let backup = read_backup(&path)?;
        restore(&mut self.conn, &backup)?;
        self.filter = None;
        self.reload(None)?;
        self.set_status(
            format!(
                "Restored {} students, {} instructors, {} courses.",
                backup.students.len(),
                backup.instructors.len(),
                backup.courses.len()
            ),
            StatusKind::Info,
        );
        Ok(())
    }

    fn open_link_picker(&mut self, link: bool) -> Result<Mode> {
        let (action, owner_id, owner_name) = match self.tab {
            EntityKind::Student => match self.students.current() {
                Some(student) => (
                    if link {
                        LinkAction::Enroll
                    } else {
                        LinkAction::Unenroll
                    },
                    student.id,
                    student.name.clone(),
                ),
                None => {
                    self.no_selection("link");
                    return Ok(Mode::Normal);
                }
            },
            EntityKind::Instructor => match self.instructors.current() {
                Some(instructor) => (
                    if link {
                        LinkAction::Assign
                    } else {
                        LinkAction::Unassign
                    },
                    instructor.id,
                    instructor.name.clone(),
                ),
                None => {
                    self.no_selection("link");
                    return Ok(Mode::Normal);
                }
            },
            EntityKind::Course => {
                self.set_status(
                    "Select a student or instructor to link courses.",
                    StatusKind::Error,
                );
                return Ok(Mode::Normal);
            }
        };

        let courses = match action {
            LinkAction::Enroll | LinkAction::Assign => fetch_courses(&self.conn)?,
            LinkAction::Unenroll => dedup_courses(courses_for_student(&self.conn, owner_id)?),
            LinkAction::Unassign => dedup_courses(courses_for_instructor(&self.conn, owner_id)?),
        };

        self.clear_status();
        Ok(Mode::Linking(LinkPicker::new(
            action, owner_id, owner_name, courses,
        )))
    }

    fn edit_form(&self) -> Option<(i64, RecordForm)> {
        match self.tab {
            EntityKind::Student => self
                .students
                .current()
                .map(|s| (s.id, RecordForm::from_student(s))),
            EntityKind::Instructor => self
                .instructors
                .current()
                .map(|i| (i.id, RecordForm::from_instructor(i))),
            EntityKind::Course => self
                .courses
                .current()
                .map(|c| (c.id, RecordForm::from_course(c))),
        }
    }

    fn delete_target(&self) -> Option<ConfirmDelete> {
        let (id, title) = match self.tab {
            EntityKind::Student => self.students.current().map(|s| (s.id, s.title()))?,
            EntityKind::Instructor => self.instructors.current().map(|i| (i.id, i.title()))?,
            EntityKind::Course => self.courses.current().map(|c| (c.id, c.title()))?,
        };
        Some(ConfirmDelete {
            kind: self.tab,
            id,
            title,
        })
    }

    /// Re-read all three lists, honoring the active search. `focus` is the
    /// internal id of a record on the current tab to highlight afterwards.
    fn reload(&mut self, focus: Option<i64>) -> Result<()> {
        let (students, instructors, courses) = match &self.filter {
            Some(filter) => {
                let results = search(&self.conn, &filter.query, filter.criteria)?;
                (results.students, results.instructors, results.courses)
            }
            None => (
                fetch_students(&self.conn)?,
                fetch_instructors(&self.conn)?,
                fetch_courses(&self.conn)?,
            ),
        };

        let focus_on = |kind: EntityKind| focus.filter(|_| self.tab == kind);
        let student_focus = position_of(&students, focus_on(EntityKind::Student));
        let instructor_focus = position_of(&instructors, focus_on(EntityKind::Instructor));
        let course_focus = position_of(&courses, focus_on(EntityKind::Course));

        self.students.set_items(students, student_focus);
        self.instructors.set_items(instructors, instructor_focus);
        self.courses.set_items(courses, course_focus);
        self.refresh_detail()
    }

    /// Rebuild the detail pane for the highlighted record.
    fn refresh_detail(&mut self) -> Result<()> {
        let detail = match self.tab {
            EntityKind::Student => match self.students.current() {
                Some(student) => {
                    let courses = courses_for_student(&self.conn, student.id)?;
                    let mut lines = vec![
                        format!("Student ID: {}", student.student_id),
                        format!("Name:       {}", student.name),
                        format!("Age:        {}", student.age),
                        format!("Email:      {}", student.email),
                        String::new(),
                    ];
                    push_section(&mut lines, "Enrolled courses", courses.iter());
                    lines
                }
                None => Vec::new(),
            },
            EntityKind::Instructor => match self.instructors.current() {
                Some(instructor) => {
                    let courses = courses_for_instructor(&self.conn, instructor.id)?;
                    let mut lines = vec![
                        format!("Instructor ID: {}", instructor.instructor_id),
                        format!("Name:          {}", instructor.name),
                        format!("Age:           {}", instructor.age),
                        format!("Email:         {}", instructor.email),
                        String::new(),
                    ];
                    push_section(&mut lines, "Teaching", courses.iter());
                    lines
                }
                None => Vec::new(),
            },
            EntityKind::Course => match self.courses.current() {
                Some(course) => {
                    let instructors = instructors_for_course(&self.conn, course.id)?;
                    let students = students_in_course(&self.conn, course.id)?;
                    let mut lines = vec![
                        format!("Course ID: {}", course.course_id),
                        format!("Name:      {}", course.course_name),
                        String::new(),
                    ];
                    push_section(
                        &mut lines,
                        "Instructors",
                        instructors.iter().map(|i| i.title()),
                    );
                    lines.push(String::new());
                    push_section(&mut lines, "Students", students.iter().map(|s| s.title()));
                    lines
                }
                None => Vec::new(),
            },
        };
        self.detail = detail;
        Ok(())
    }

    fn switch_tab(&mut self, tab: EntityKind) -> Result<()> {
        if self.tab != tab {
            self.tab = tab;
            self.clear_status();
            self.refresh_detail()?;
        }
        Ok(())
    }

    fn move_selection(&mut self, offset: isize) -> Result<()> {
        match self.tab {
            EntityKind::Student => self.students.move_selection(offset),
            EntityKind::Instructor => self.instructors.move_selection(offset),
            EntityKind::Course => self.courses.move_selection(offset),
        }
        self.refresh_detail()
    }

    fn select_edge(&mut self, first: bool) -> Result<()> {
        match (self.tab, first) {
            (EntityKind::Student, true) => self.students.select_first(),
            (EntityKind::Student, false) => self.students.select_last(),
            (EntityKind::Instructor, true) => self.instructors.select_first(),
            (EntityKind::Instructor, false) => self.instructors.select_last(),
            (EntityKind::Course, true) => self.courses.select_first(),
            (EntityKind::Course, false) => self.courses.select_last(),
        }
        self.refresh_detail()
    }
}

/// Evenly sized columns, with the first (identifier) column kept narrow.
fn column_widths(count: usize) -> Vec<Constraint> {
    let mut widths = vec![Constraint::Length(14)];
    widths.extend((1..count).map(|_| Constraint::Fill(1)));
    widths
}

fn push_section<I, D>(lines: &mut Vec<String>, heading: &str, entries: I)
where
    I: Iterator<Item = D>,
    D: ToString,
{
    lines.push(format!("{heading}:"));
    let before = lines.len();
    lines.extend(entries.map(|entry| format!("  - {}", entry.to_string())));
    if lines.len() == before {
        lines.push("  (none)".to_string());
    }
}

/// Collapse duplicate relationship rows so each course is offered once.
fn dedup_courses(courses: Vec<Course>) -> Vec<Course> {
    let mut seen = Vec::with_capacity(courses.len());
    let mut unique = Vec::with_capacity(courses.len());
    for course in courses {
        if !seen.contains(&course.id) {
            seen.push(course.id);
            unique.push(course);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn app() -> App {
        let conn = open_in_memory().unwrap();
        App::new(conn, AppPaths::from_dir("/tmp/school-records-test")).unwrap()
    }

    fn footer_text(app: &App) -> String {
        app.footer_instructions()
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect()
    }

    #[test]
    fn restore_hint_is_shown_on_every_tab() {
        let mut app = app();
        for kind in EntityKind::ALL {
            app.switch_tab(kind).unwrap();
            assert!(
                footer_text(&app).contains("[R] Restore"),
                "missing on {kind}"
            );
        }
    }

    #[test]
    fn link_hints_are_hidden_on_courses() {
        let mut app = app();
        assert!(footer_text(&app).contains("[l] Link course"));
        app.switch_tab(EntityKind::Course).unwrap();
        assert!(!footer_text(&app).contains("[l]"));
    }
}
