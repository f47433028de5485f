//! Core library surface for the School Records manager.
//!
//! `db` is the Record Store: every SQL statement lives there. `validation`
//! checks form input before it reaches the store, `backup` and `export` write
//! the JSON backup and CSV listing, and `ui` is the terminal front-end that
//! ties them together.
pub mod backup;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod models;
pub mod ui;
pub mod validation;

/// Convenience re-exports for the persistence layer.
pub use db::{open, open_in_memory, search, SearchCriteria, SearchResults};

/// Domain types that other layers manipulate.
pub use models::{Assignment, Backup, Course, EntityKind, Instructor, Registration, Student};

pub use validation::{CourseDraft, PersonDraft, ValidationError};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
